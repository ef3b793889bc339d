pub mod view_service;

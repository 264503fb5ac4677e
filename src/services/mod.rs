pub mod event_api;

pub mod role_handler;

pub mod sqlite_control_store;

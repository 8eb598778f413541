/// Warehouse-directory table source implementation.
pub mod warehouse_source;

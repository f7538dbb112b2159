pub mod charts;
pub mod kpi;
pub mod panels;
pub mod tables;

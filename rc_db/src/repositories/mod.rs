//! ABOUTME: Repository modules providing parameterized database operations
//! ABOUTME: Each repository handles reads and writes for one entity type

pub mod activists;

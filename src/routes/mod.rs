pub mod agents;
pub mod managers;
pub mod students;

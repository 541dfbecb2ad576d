pub mod created;

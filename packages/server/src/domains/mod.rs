// Business domains
pub mod crisis;
pub mod locations;
pub mod needs;
pub mod providers;
pub mod search;

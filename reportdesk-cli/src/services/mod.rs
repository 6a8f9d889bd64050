// Business logic services layer
//
// Pure services shared by the CLI commands and the report flows.

pub mod mapping;

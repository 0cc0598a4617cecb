pub mod federation;
pub mod machine_learning;

mod builder;

pub use builder::LocalModelBuilder;

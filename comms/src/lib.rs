mod blob;
mod deserialize;
mod serialize;
pub mod specs;

pub use blob::{ModelBlob, ModelState};
pub use deserialize::Deserialize;
pub use serialize::Serialize;

mod layer;
mod r#type;

pub use layer::Layer;
pub use r#type::Type;

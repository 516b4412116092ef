pub mod instance_reader;
pub use instance_reader::{Instance, InstanceReader};
pub mod instance_writer;
pub use instance_writer::InstanceWriter;

pub mod segmentation_writer;
pub use segmentation_writer::SegmentationWriter;

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::segment::Segmentation;

/// Writes a segmentation as
///
/// ```text
/// s <number of segments> <total cost>
/// <master> <cost> <member> <member> ...
/// ```
///
/// with one line per segment (in the order of the master nodes) and 1-based node ids.
pub trait SegmentationWriter {
    fn try_write_segmentation<W: Write>(&self, writer: W) -> Result<(), std::io::Error>;
    fn try_write_segmentation_file<P: AsRef<Path>>(&self, path: P)
    -> Result<(), std::io::Error>;
}

impl SegmentationWriter for Segmentation {
    fn try_write_segmentation<W: Write>(&self, mut writer: W) -> Result<(), std::io::Error> {
        writeln!(writer, "s {} {}", self.number_of_segments(), self.total_cost())?;

        for segment in self.segments() {
            write!(writer, "{} {}", segment.master() + 1, segment.cost())?;
            for &u in segment.nodes() {
                write!(writer, " {}", u + 1)?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }

    fn try_write_segmentation_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<(), std::io::Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.try_write_segmentation(&mut writer)?;
        writer.flush()
    }
}

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use super::Instance;
use crate::graph::*;

pub trait InstanceWriter {
    fn try_write_instance<W: Write>(&self, writer: W) -> Result<(), std::io::Error>;
    fn try_write_instance_file<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error>;
}

impl InstanceWriter for Instance {
    /// Writes the instance in the format accepted by [`Instance::try_read`]
    fn try_write_instance<W: Write>(&self, mut writer: W) -> Result<(), std::io::Error> {
        writeln!(
            writer,
            "p seg {} {} {}",
            self.graph.number_of_nodes(),
            self.graph.number_of_edges(),
            self.masters.len()
        )?;

        for (u, color) in self.graph.colors().iter().enumerate() {
            writeln!(writer, "v {} {color}", u + 1)?;
        }

        for WeightedEdge(u, v, w) in self.graph.weighted_edges() {
            match w {
                Some(w) => writeln!(writer, "e {} {} {w}", u + 1, v + 1)?,
                None => writeln!(writer, "e {} {}", u + 1, v + 1)?,
            }
        }

        for &t in &self.masters {
            writeln!(writer, "m {}", t + 1)?;
        }

        Ok(())
    }

    fn try_write_instance_file<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let writer = BufWriter::new(File::create(path)?);
        self.try_write_instance(writer)
    }
}

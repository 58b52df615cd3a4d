//! Reads and writes GOLF's compiled program format: a little-endian
//! `u32` data-segment length, the read-only data bytes themselves, then the
//! instruction stream running to the end of the file.

use byteorder::{ReadBytesExt, WriteBytesExt};
use golf_util::Endian;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A compiled GOLF program: the pooled read-only data segment plus the
/// encoded instruction stream.
#[derive(Debug, PartialEq)]
pub struct Executable {
    data: Vec<u8>,
    instructions: Vec<u8>,
}

impl Executable {
    pub fn from(data: Vec<u8>, instructions: Vec<u8>) -> Executable {
        Executable { data, instructions }
    }

    pub fn copy_from(data: &[u8], instructions: &[u8]) -> Executable {
        Executable {
            data: Vec::from(data),
            instructions: Vec::from(instructions),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    pub fn instructions(&self) -> &[u8] {
        &self.instructions[..]
    }
}

pub fn read<R: Read>(reader: &mut R) -> std::io::Result<Executable> {
    let data_length = reader.read_u32::<Endian>()?;
    let mut data = vec![0; data_length as usize];
    reader.read_exact(&mut data)?;

    let mut instructions = Vec::new();
    reader.read_to_end(&mut instructions)?;

    Ok(Executable::from(data, instructions))
}

pub fn write<W: Write>(writer: &mut W, executable: &Executable) -> std::io::Result<()> {
    writer.write_u32::<Endian>(executable.data.len() as u32)?;
    writer.write_all(&executable.data[..])?;
    writer.write_all(&executable.instructions[..])?;
    Ok(())
}

pub trait ReadGolfExt: Read + Sized {
    fn read_golf(&mut self) -> std::io::Result<Executable> {
        read(self)
    }
}

impl<R: Read + Sized> ReadGolfExt for R {}

pub trait WriteGolfExt: Write + Sized {
    fn write_golf(&mut self, executable: &Executable) -> std::io::Result<()> {
        write(self, executable)
    }
}

impl<W: Write + Sized> WriteGolfExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> std::io::Result<Executable> {
    BufReader::new(File::open(path)?).read_golf()
}

pub fn write_file<P: AsRef<Path>>(path: P, executable: &Executable) -> std::io::Result<()> {
    BufWriter::new(File::create(path)?).write_golf(executable)
}

#[cfg(test)]
mod test;

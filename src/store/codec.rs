//! # Compression codecs
//!
//! Submission files may be plain, gzip or bzip2. The codec a file claims is
//! taken from its extension, the codec it uses is sniffed from its magic
//! bytes. Concatenated archives are not supported.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read};

use bzip2::bufread::BzDecoder as BzStreamDecoder;
use bzip2::read::BzDecoder;
use flate2::bufread::GzDecoder as GzStreamDecoder;
use flate2::read::GzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const BZIP2_MAGIC: [u8; 3] = *b"BZh";

/// Compression of a submission file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
}

impl Compression {
    /// Codec claimed by the file name
    pub fn from_extension(name: &str) -> Self {
        if name.ends_with(".gz") {
            Compression::Gzip
        } else if name.ends_with(".bz2") {
            Compression::Bzip2
        } else {
            Compression::None
        }
    }

    /// Codec actually used, from the first bytes of the file
    pub fn sniff(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            Compression::Gzip
        } else if head.starts_with(&BZIP2_MAGIC) {
            Compression::Bzip2
        } else {
            Compression::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
        }
    }

    /// Wraps a raw stream in the matching decoder
    pub fn decoder(&self, raw: Box<dyn Read + Send>) -> Box<dyn Read + Send> {
        match self {
            Compression::None => raw,
            Compression::Gzip => Box::new(GzDecoder::new(raw)),
            Compression::Bzip2 => Box::new(BzDecoder::new(raw)),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of decoding a whole compressed stream
#[derive(Debug)]
pub enum StreamIntegrity {
    Intact,
    /// A complete stream was followed by more data
    Concatenated,
    Corrupt(io::Error),
}

/// Decodes the whole stream, checking it holds exactly one archive
pub fn verify_stream(raw: Box<dyn Read + Send>, compression: Compression) -> StreamIntegrity {
    let buffered = BufReader::new(raw);
    let result = match compression {
        Compression::None => return StreamIntegrity::Intact,
        Compression::Gzip => drain_single(GzStreamDecoder::new(buffered), GzStreamDecoder::into_inner),
        Compression::Bzip2 => drain_single(BzStreamDecoder::new(buffered), BzStreamDecoder::into_inner),
    };
    match result {
        Ok(true) => StreamIntegrity::Intact,
        Ok(false) => StreamIntegrity::Concatenated,
        Err(e) => StreamIntegrity::Corrupt(e),
    }
}

fn drain_single<D, R>(mut decoder: D, into_inner: fn(D) -> R) -> io::Result<bool>
where
    D: Read,
    R: BufRead,
{
    io::copy(&mut decoder, &mut io::sink())?;
    let mut rest = into_inner(decoder);
    Ok(rest.fill_buf()?.is_empty())
}

//! 入出力ヘルパー（gzip 対応）
//!
//! `-` は標準入出力、拡張子 `.gz` は透過的に圧縮・展開する。

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const READER_BUF_CAP: usize = 128 * 1024; // 128 KiB

fn is_stdio(p: &Path) -> bool {
    p.as_os_str() == "-"
}

fn is_gzip(p: &Path) -> bool {
    p.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// 入力を開く
pub fn open_reader<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let p = path.as_ref();
    if is_stdio(p) {
        return Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, io::stdin())));
    }
    let f = File::open(p)?;
    if is_gzip(p) {
        let dec = flate2::read::MultiGzDecoder::new(f);
        return Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, dec)));
    }
    Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, f)))
}

/// Report output sink. Compressed output is only complete after [`ReportWriter::close`].
#[must_use = "call .close() to propagate compression/IO errors"]
pub enum ReportWriter {
    File(BufWriter<File>),
    Stdout(io::Stdout),
    Gz(flate2::write::GzEncoder<BufWriter<File>>),
}

impl Write for ReportWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ReportWriter::File(f) => f.write(buf),
            ReportWriter::Stdout(s) => s.write(buf),
            ReportWriter::Gz(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ReportWriter::File(f) => f.flush(),
            ReportWriter::Stdout(s) => s.flush(),
            ReportWriter::Gz(e) => e.flush(),
        }
    }
}

impl ReportWriter {
    /// Finish the gzip trailer (if any) and flush everything down to the file.
    pub fn close(self) -> io::Result<()> {
        match self {
            ReportWriter::File(mut f) => f.flush(),
            ReportWriter::Stdout(mut s) => s.flush(),
            ReportWriter::Gz(e) => e.finish()?.flush(),
        }
    }
}

/// 出力先を開く
pub fn open_writer<P: AsRef<Path>>(path: P) -> io::Result<ReportWriter> {
    let p = path.as_ref();
    if is_stdio(p) {
        return Ok(ReportWriter::Stdout(io::stdout()));
    }
    let f = BufWriter::new(File::create(p)?);
    if is_gzip(p) {
        let enc = flate2::write::GzEncoder::new(f, flate2::Compression::default());
        return Ok(ReportWriter::Gz(enc));
    }
    Ok(ReportWriter::File(f))
}

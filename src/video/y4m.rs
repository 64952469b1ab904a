// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! YUV4MPEG2 (`.y4m`) reader and writer.
//!
//! Y4M is the simplest container that carries uncompressed planar YUV, which
//! is exactly what the embedder needs: the luminance plane is available
//! as-is and re-encoding is lossless. Layout:
//!
//! ```text
//! YUV4MPEG2 W<width> H<height> [F.. I.. A.. X..] [C<colorspace>]\n
//! FRAME[ <params>]\n <Y plane> <Cb plane> <Cr plane>
//! FRAME[ <params>]\n ...
//! ```
//!
//! Only 8-bit colorspaces are supported. Header tags other than `W`, `H` and
//! `C` (frame rate, interlacing, aspect, comments) are kept verbatim so a
//! stego stream has the same header as its cover.

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

use super::error::{Result, VideoError};
use super::{Frame, FrameSink, FrameSource, Plane};

const STREAM_MAGIC: &[u8] = b"YUV4MPEG2";
const FRAME_MAGIC: &[u8] = b"FRAME";

/// Upper bound for a header or frame line, including the newline.
const MAX_LINE: u64 = 4096;

/// Largest accepted width or height.
pub const MAX_DIMENSION: usize = 16_384;

/// Chroma layout of an 8-bit Y4M stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaLayout {
    /// 4:2:0, chroma planes at half width and half height.
    Yuv420,
    /// 4:2:2, chroma planes at half width.
    Yuv422,
    /// 4:4:4, full-resolution chroma.
    Yuv444,
    /// Luminance only.
    Mono,
}

impl ChromaLayout {
    fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "420jpeg" | "420paldv" | "420mpeg2" | "420" => Ok(Self::Yuv420),
            "422" => Ok(Self::Yuv422),
            "444" => Ok(Self::Yuv444),
            "mono" => Ok(Self::Mono),
            other => Err(VideoError::UnsupportedColorspace(other.to_string())),
        }
    }

    /// Dimensions of one chroma plane, or `None` for monochrome.
    pub fn chroma_size(self, width: usize, height: usize) -> Option<(usize, usize)> {
        match self {
            Self::Yuv420 => Some((width.div_ceil(2), height.div_ceil(2))),
            Self::Yuv422 => Some((width.div_ceil(2), height)),
            Self::Yuv444 => Some((width, height)),
            Self::Mono => None,
        }
    }
}

/// Parsed stream header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Y4mHeader {
    pub width: usize,
    pub height: usize,
    pub layout: ChromaLayout,
    /// Colorspace tag as written in the stream (`420jpeg`, `444`, ...).
    pub colorspace: String,
    /// Remaining tags, verbatim and in order.
    pub extra_tags: Vec<String>,
}

impl Y4mHeader {
    /// Header for a 4:2:0 stream with no optional tags.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            layout: ChromaLayout::Yuv420,
            colorspace: "420jpeg".to_string(),
            extra_tags: Vec::new(),
        }
    }

    /// Header for a luminance-only stream.
    pub fn mono(width: usize, height: usize) -> Self {
        Self {
            layout: ChromaLayout::Mono,
            colorspace: "mono".to_string(),
            ..Self::new(width, height)
        }
    }

    fn parse(line: &[u8]) -> Result<Self> {
        if !line.is_ascii() {
            return Err(VideoError::InvalidHeader("header is not ASCII".into()));
        }
        let text = String::from_utf8_lossy(line);
        let mut tokens = text.split(' ').filter(|t| !t.is_empty());

        if tokens.next().map(str::as_bytes) != Some(STREAM_MAGIC) {
            return Err(VideoError::InvalidHeader("missing YUV4MPEG2 signature".into()));
        }

        let mut width = None;
        let mut height = None;
        let mut colorspace = None;
        let mut extra_tags = Vec::new();

        for token in tokens {
            let (tag, value) = token.split_at(1);
            match tag {
                "W" => width = Some(parse_dimension(value, "W")?),
                "H" => height = Some(parse_dimension(value, "H")?),
                "C" => colorspace = Some(value.to_string()),
                _ => extra_tags.push(token.to_string()),
            }
        }

        let width = width.ok_or_else(|| VideoError::InvalidHeader("missing W tag".into()))?;
        let height = height.ok_or_else(|| VideoError::InvalidHeader("missing H tag".into()))?;
        let colorspace = colorspace.unwrap_or_else(|| "420jpeg".to_string());
        let layout = ChromaLayout::from_tag(&colorspace)?;

        let header = Self { width, height, layout, colorspace, extra_tags };
        header.frame_len()?;
        Ok(header)
    }

    fn to_line(&self) -> String {
        let mut line = format!("YUV4MPEG2 W{} H{}", self.width, self.height);
        for tag in &self.extra_tags {
            line.push(' ');
            line.push_str(tag);
        }
        line.push_str(" C");
        line.push_str(&self.colorspace);
        line.push('\n');
        line
    }

    fn luma_len(&self) -> usize {
        self.width * self.height
    }

    /// Bytes of sample data in one frame.
    ///
    /// # Errors
    /// [`VideoError::InvalidDimensions`] if a side exceeds [`MAX_DIMENSION`]
    /// or the size does not fit `usize`.
    pub fn frame_len(&self) -> Result<usize> {
        let invalid = || VideoError::InvalidDimensions { width: self.width, height: self.height };
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(invalid());
        }
        let luma = self.width.checked_mul(self.height).ok_or_else(invalid)?;
        let chroma = match self.layout.chroma_size(self.width, self.height) {
            Some((cw, ch)) => cw.checked_mul(ch).and_then(|n| n.checked_mul(2)).ok_or_else(invalid)?,
            None => 0,
        };
        luma.checked_add(chroma).ok_or_else(invalid)
    }
}

fn parse_dimension(value: &str, tag: &str) -> Result<usize> {
    match value.parse::<usize>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(VideoError::InvalidHeader(format!("bad {tag} value {value:?}"))),
    }
}

/// Read one `\n`-terminated line, without the terminator.
/// Returns `None` at a clean end of stream.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let n = reader.by_ref().take(MAX_LINE).read_until(b'\n', &mut line)?;
    if n == 0 {
        return Ok(None);
    }
    if line.last() != Some(&b'\n') {
        return Err(VideoError::InvalidHeader("unterminated or overlong line".into()));
    }
    line.pop();
    Ok(Some(line))
}

/// Fill `buf` as far as the reader allows; returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Streaming Y4M frame reader.
pub struct Y4mReader<R: Read> {
    reader: BufReader<R>,
    header: Y4mHeader,
    frames_read: usize,
}

impl<R: Read> Y4mReader<R> {
    /// Parse the stream header and position the reader at the first frame.
    pub fn new(reader: R) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let line = read_line(&mut reader)?
            .ok_or_else(|| VideoError::InvalidHeader("empty stream".into()))?;
        let header = Y4mHeader::parse(&line)?;
        tracing::debug!(
            width = header.width,
            height = header.height,
            colorspace = %header.colorspace,
            "opened Y4M stream"
        );
        Ok(Self { reader, header, frames_read: 0 })
    }

    pub fn header(&self) -> &Y4mHeader {
        &self.header
    }

    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    fn read_plane(&mut self, width: usize, height: usize) -> Result<Plane> {
        let mut samples = vec![0u8; width * height];
        let n = read_full(&mut self.reader, &mut samples)?;
        if n != samples.len() {
            return Err(VideoError::TruncatedFrame { expected: samples.len(), actual: n });
        }
        Plane::from_samples(width, height, samples)
    }
}

impl<R: Read> FrameSource for Y4mReader<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(line) = read_line(&mut self.reader)? else {
            return Ok(None);
        };
        let params_ok = match line.strip_prefix(FRAME_MAGIC) {
            Some(rest) => rest.is_empty() || rest.starts_with(b" "),
            None => false,
        };
        if !params_ok {
            return Err(VideoError::InvalidHeader(format!(
                "expected FRAME marker before frame {}",
                self.frames_read
            )));
        }

        let (w, h) = (self.header.width, self.header.height);
        let luma = self.read_plane(w, h)?;
        let chroma = match self.header.layout.chroma_size(w, h) {
            Some((cw, ch)) => vec![self.read_plane(cw, ch)?, self.read_plane(cw, ch)?],
            None => Vec::new(),
        };

        self.frames_read += 1;
        Ok(Some(Frame { luma, chroma }))
    }
}

/// Y4M frame writer. The stream header is written on construction.
pub struct Y4mWriter<W: Write> {
    writer: BufWriter<W>,
    header: Y4mHeader,
    frames_written: usize,
}

impl<W: Write> Y4mWriter<W> {
    pub fn new(writer: W, header: Y4mHeader) -> Result<Self> {
        let mut writer = BufWriter::new(writer);
        writer.write_all(header.to_line().as_bytes())?;
        Ok(Self { writer, header, frames_written: 0 })
    }

    pub fn header(&self) -> &Y4mHeader {
        &self.header
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| VideoError::Io(e.into_error()))
    }

    fn check_geometry(&self, frame: &Frame) -> Result<()> {
        let (w, h) = (self.header.width, self.header.height);
        let mismatch = |plane: &Plane, width: usize, height: usize| VideoError::FrameSizeMismatch {
            width,
            height,
            actual_width: plane.width(),
            actual_height: plane.height(),
        };

        if frame.luma.width() != w || frame.luma.height() != h {
            return Err(mismatch(&frame.luma, w, h));
        }
        match self.header.layout.chroma_size(w, h) {
            Some((cw, ch)) => {
                if frame.chroma.len() != 2 {
                    return Err(VideoError::UnsupportedColorspace(format!(
                        "stream {} needs 2 chroma planes, frame has {}",
                        self.header.colorspace,
                        frame.chroma.len()
                    )));
                }
                for plane in &frame.chroma {
                    if plane.width() != cw || plane.height() != ch {
                        return Err(mismatch(plane, cw, ch));
                    }
                }
            }
            None => {
                if !frame.chroma.is_empty() {
                    return Err(VideoError::UnsupportedColorspace(
                        "mono stream cannot carry chroma planes".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl<W: Write> FrameSink for Y4mWriter<W> {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.check_geometry(frame)?;
        debug_assert_eq!(frame.luma.samples().len(), self.header.luma_len());

        self.writer.write_all(FRAME_MAGIC)?;
        self.writer.write_all(b"\n")?;
        self.writer.write_all(frame.luma.samples())?;
        for plane in &frame.chroma {
            self.writer.write_all(plane.samples())?;
        }
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

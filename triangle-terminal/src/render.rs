//! Draw frames as true color blocks. One row per segment, redrawn in place.
use std::io::{self, Write};

use smart_leds::RGB8;
use triangle_lights_core::lights::{StripLayout, corrected};

pub struct TerminalRenderer<W: Write> {
    out: W,
    layout: StripLayout,
    brightness: u8,
    /// gamma corrected and dimmed copy of the last frame
    buf: Vec<RGB8>,
    drawn: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, layout: StripLayout, brightness: u8) -> Self {
        Self {
            out,
            layout,
            brightness,
            buf: Vec::with_capacity(layout.num_leds()),
            drawn: false,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// what the strip would actually show for the last frame
    pub fn last_frame(&self) -> &[RGB8] {
        &self.buf
    }

    pub fn render(&mut self, frame: &[RGB8]) -> io::Result<()> {
        self.buf.clear();
        self.buf.extend(corrected(frame, self.brightness));

        if self.drawn {
            // back to the start of the first row
            write!(self.out, "\x1b[{}F", self.layout.num_segments())?;
        }

        for segment in self.layout.segments() {
            for color in &self.buf[segment] {
                write!(
                    self.out,
                    "\x1b[48;2;{};{};{}m  ",
                    color.r, color.g, color.b
                )?;
            }

            writeln!(self.out, "\x1b[0m")?;
        }

        self.out.flush()?;

        self.drawn = true;

        Ok(())
    }
}

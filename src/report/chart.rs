// Bar charts drawn straight into a bitmap.

use std::io::Cursor;

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{ImageFormat, Rgb, RgbImage};
use likert_tally::{ChartRenderer, Histogram};
use log::debug;
use snafu::prelude::*;

pub const Y_AXIS_LABEL: &str = "Number of Responses";

// One colour per answer, repeated when there are more than five answers.
const BAR_COLORS: [[u8; 3]; 5] = [
    [44, 160, 44],   // green
    [31, 119, 180],  // blue
    [214, 39, 40],   // red
    [255, 127, 14],  // orange
    [227, 119, 194], // pink
];
const WHITE: [u8; 3] = [255, 255, 255];
const BLACK: [u8; 3] = [0, 0, 0];
const GRID: [u8; 3] = [220, 220, 220];

const MARGIN_LEFT: u32 = 96;
const MARGIN_RIGHT: u32 = 24;
const MARGIN_TOP: u32 = 56;
const MARGIN_BOTTOM: u32 = 48;

// Text is drawn with 8x8 bitmap glyphs, scaled up.
const GLYPH_SIZE: u32 = 8;
const TEXT_SCALE: u32 = 2;
const TITLE_TOP: u32 = 10;
const Y_LABEL_LEFT: u32 = 8;

/// How much of the question label goes into the chart title.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ChartTitle {
    Full,
    /// Only the text before the first occurrence of the character, for example
    /// `BeforeSeparator('.')` turns `12. Do you agree?` into `12`.
    BeforeSeparator(char),
}

impl ChartTitle {
    pub fn apply(&self, label: &str) -> String {
        match self {
            ChartTitle::Full => label.trim().to_string(),
            ChartTitle::BeforeSeparator(sep) => label
                .split(*sep)
                .next()
                .unwrap_or(label)
                .trim()
                .to_string(),
        }
    }
}

/// A chart encoded as PNG. The title and the axis labels are part of the image.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RenderedChart {
    pub title: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Snafu)]
pub enum ChartError {
    #[snafu(display("Cannot draw the chart {title:?} on a {width}x{height} canvas"))]
    CanvasTooSmall {
        title: String,
        width: u32,
        height: u32,
    },
    #[snafu(display("Error encoding the chart {title:?}"))]
    EncodingPng {
        source: image::ImageError,
        title: String,
    },
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BarChartRenderer {
    pub width: u32,
    pub height: u32,
    pub title: ChartTitle,
}

impl Default for BarChartRenderer {
    // 6 x 4.5 inches at 96 dpi, which fits in the text width of a letter or A4 page.
    fn default() -> Self {
        BarChartRenderer {
            width: 576,
            height: 432,
            title: ChartTitle::Full,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
}

impl PlotArea {
    fn width(&self) -> u32 {
        self.right - self.left
    }

    // Pixel row of a count, given the top of the axis.
    fn y_of(&self, count: u64, y_max: u64) -> u32 {
        let span = (self.bottom - self.top) as u64;
        let h = count.min(y_max) * span / y_max;
        self.bottom - h as u32
    }
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Center,
    Right,
}

impl ChartRenderer for BarChartRenderer {
    type Chart = RenderedChart;
    type Error = ChartError;

    fn render(
        &self,
        label: &str,
        histogram: &Histogram,
        y_axis_upper_bound: u64,
    ) -> Result<RenderedChart, ChartError> {
        let title = self.title.apply(label);
        ensure!(
            self.width >= MARGIN_LEFT + MARGIN_RIGHT + 2 * GLYPH_SIZE * TEXT_SCALE
                && self.height >= MARGIN_TOP + MARGIN_BOTTOM + GLYPH_SIZE * TEXT_SCALE,
            CanvasTooSmallSnafu {
                title,
                width: self.width,
                height: self.height,
            }
        );

        let img = self.draw(&title, histogram, y_axis_upper_bound.max(1));
        let mut png: Vec<u8> = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .context(EncodingPngSnafu {
                title: title.clone(),
            })?;
        debug!(
            "render: chart {:?} counts: {:?} png size: {}",
            title,
            histogram.counts(),
            png.len()
        );
        Ok(RenderedChart {
            title,
            png,
            width: self.width,
            height: self.height,
        })
    }
}

impl BarChartRenderer {
    fn plot_area(&self) -> PlotArea {
        PlotArea {
            left: MARGIN_LEFT,
            right: self.width - MARGIN_RIGHT,
            top: MARGIN_TOP,
            bottom: self.height - MARGIN_BOTTOM,
        }
    }

    fn draw(&self, title: &str, histogram: &Histogram, y_max: u64) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.width, self.height, Rgb(WHITE));
        let plot = self.plot_area();

        // Long labels fall back to the small font, and are clipped past that.
        let title_scale = fitting_scale(title, self.width);
        draw_text(
            &mut img,
            title,
            self.width / 2,
            TITLE_TOP,
            title_scale,
            Anchor::Center,
        );
        let label_scale = fitting_scale(Y_AXIS_LABEL, plot.bottom - plot.top);
        draw_text_upward(
            &mut img,
            Y_AXIS_LABEL,
            Y_LABEL_LEFT,
            (plot.top + plot.bottom) / 2,
            label_scale,
        );

        // Horizontal grid and tick labels.
        let step = ((y_max + 9) / 10).max(1);
        let mut tick: u64 = 0;
        while tick <= y_max {
            let y = plot.y_of(tick, y_max);
            fill_rect(&mut img, plot.left, y, plot.width(), 1, GRID);
            fill_rect(&mut img, plot.left - 6, y, 6, 1, BLACK);
            draw_text(
                &mut img,
                &tick.to_string(),
                plot.left - 10,
                y.saturating_sub(GLYPH_SIZE * TEXT_SCALE / 2),
                TEXT_SCALE,
                Anchor::Right,
            );
            tick += step;
        }

        let num_bars = histogram.counts().len().max(1) as u32;
        let slot = plot.width() / num_bars;
        let bar_width = (slot * 3 / 5).max(1);
        for (idx, (answer, count)) in histogram.iter().enumerate() {
            let color = BAR_COLORS[idx % BAR_COLORS.len()];
            let x = plot.left + slot * idx as u32 + slot.saturating_sub(bar_width) / 2;
            let top = plot.y_of(count, y_max);
            fill_rect(&mut img, x, top, bar_width, plot.bottom - top, color);

            let center = x + bar_width / 2;
            draw_text(
                &mut img,
                &count.to_string(),
                center,
                top.saturating_sub(GLYPH_SIZE * TEXT_SCALE + 4),
                TEXT_SCALE,
                Anchor::Center,
            );
            draw_text(
                &mut img,
                &answer.to_string(),
                center,
                plot.bottom + 10,
                TEXT_SCALE,
                Anchor::Center,
            );
        }

        // Axes last, so that they are drawn over the bars.
        fill_rect(
            &mut img,
            plot.left,
            plot.top,
            2,
            plot.bottom - plot.top + 2,
            BLACK,
        );
        fill_rect(&mut img, plot.left, plot.bottom, plot.width(), 2, BLACK);
        img
    }
}

// Clipped to the image.
fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
    let x_end = x.saturating_add(w).min(img.width());
    let y_end = y.saturating_add(h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, Rgb(color));
        }
    }
}

// Unknown characters are drawn as '?'.
fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or_default()
}

fn text_length(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

fn fitting_scale(text: &str, room: u32) -> u32 {
    if text_length(text, TEXT_SCALE) <= room {
        TEXT_SCALE
    } else {
        1
    }
}

// Glyph rows are bytes, the least significant bit is the leftmost pixel.
fn draw_text(
    img: &mut RgbImage,
    text: &str,
    anchor_x: u32,
    top: u32,
    scale: u32,
    anchor: Anchor,
) {
    let length = text_length(text, scale);
    let left = match anchor {
        Anchor::Center => anchor_x.saturating_sub(length / 2),
        Anchor::Right => anchor_x.saturating_sub(length),
    };
    for (pos, c) in text.chars().enumerate() {
        let x0 = left + pos as u32 * GLYPH_SIZE * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) != 0 {
                    fill_rect(
                        img,
                        x0 + col * scale,
                        top + row as u32 * scale,
                        scale,
                        scale,
                        BLACK,
                    );
                }
            }
        }
    }
}

// Text turned a quarter counterclockwise, read from the bottom up, centered on `center_y`.
fn draw_text_upward(img: &mut RgbImage, text: &str, left: u32, center_y: u32, scale: u32) {
    let bottom = center_y + text_length(text, scale) / 2;
    for (pos, c) in text.chars().enumerate() {
        let advance = pos as u32 * GLYPH_SIZE;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) != 0 {
                    let Some(y) = bottom.checked_sub((advance + col + 1) * scale) else {
                        continue;
                    };
                    fill_rect(img, left + row as u32 * scale, y, scale, scale, BLACK);
                }
            }
        }
    }
}

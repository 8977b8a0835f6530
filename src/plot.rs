#![cfg(not(tarpaulin_include))]
#![cfg(feature = "render")]
use crate::codec;
use crate::error::PlotError;
use crate::geometry::{self, Point};
use crate::html::{RenderedHtml, download_anchor, img_tag};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, ImageOutputFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use std::ops::Range;

/// Number of points used to approximate arcs and circles.
const ARC_RESOLUTION: usize = 100;

/// Points per corner of a rounded rectangle.
const CORNER_RESOLUTION: usize = 50;

const AXIS_GRAY: RGBColor = RGBColor(128, 128, 128);

/// Head length of axis arrows, in figure units.
const AXIS_HEAD: f64 = 0.1;

/// Head length of each end of a double arrow, in figure units.
const DOUBLE_HEAD: f64 = 0.08;

/// Drawing elements a figure can hold, in figure coordinates.
#[derive(Clone, Debug)]
pub enum Element {
    /// Connected line through the given points
    Line {
        points: Vec<Point>,
        color: RGBColor,
        width: u32,
    },

    /// Straight segment, solid or dashed
    Segment {
        start: Point,
        end: Point,
        color: RGBColor,
        width: u32,
        dashed: bool,
    },

    /// Segment with an open arrowhead at `end`
    Arrow {
        start: Point,
        end: Point,
        color: RGBColor,
        width: u32,
        head_length: f64,
    },

    /// Circle outline or disc
    Circle {
        center: Point,
        radius: f64,
        color: RGBColor,
        filled: bool,
    },

    /// Circular arc between two angles in degrees
    Arc {
        center: Point,
        radius: f64,
        start_deg: f64,
        end_deg: f64,
        color: RGBColor,
    },

    /// Text label anchored at its top-left corner
    Text {
        position: Point,
        text: String,
        size: u32,
        color: RGBColor,
    },
}

impl Element {
    // Points used to fit the automatic axis ranges.
    fn extent(&self) -> Vec<Point> {
        match self {
            Element::Line { points, .. } => points.clone(),
            Element::Segment { start, end, .. } | Element::Arrow { start, end, .. } => {
                vec![*start, *end]
            }
            Element::Circle { center, radius, .. } => vec![
                (center.0 - radius, center.1 - radius),
                (center.0 + radius, center.1 + radius),
            ],
            Element::Arc {
                center,
                radius,
                start_deg,
                end_deg,
                ..
            } => geometry::arc_points(*center, *radius, *start_deg, *end_deg, ARC_RESOLUTION),
            Element::Text { position, .. } => vec![*position],
        }
    }
}

/// A plot under construction
///
/// The figure is an explicit handle: every drawing call goes through it and
/// rendering reads only its own state, so independent figures never interfere.
///
/// # Examples
/// ```
/// use mecsimcalc::plot::Figure;
///
/// let figure = Figure::new(320, 240)
///     .without_axes()
///     .plot_line(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.5)]);
/// let png = figure.to_png().unwrap();
/// assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
/// ```
#[derive(Clone, Debug)]
pub struct Figure {
    width: u32,
    height: u32,
    x_range: Option<Range<f64>>,
    y_range: Option<Range<f64>>,
    title: Option<String>,
    x_label: String,
    y_label: String,
    show_axes: bool,
    elements: Vec<Element>,
}

impl Figure {
    /// Create an empty figure of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            x_range: None,
            y_range: None,
            title: None,
            x_label: String::new(),
            y_label: String::new(),
            show_axes: true,
            elements: Vec::new(),
        }
    }

    pub fn with_x_range(mut self, range: Range<f64>) -> Self {
        self.x_range = Some(range);
        self
    }

    pub fn with_y_range(mut self, range: Range<f64>) -> Self {
        self.y_range = Some(range);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    /// Draw a blank canvas: no mesh, tick labels or axis descriptions.
    pub fn without_axes(mut self) -> Self {
        self.show_axes = false;
        self
    }

    pub fn push(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn plot_line(self, points: Vec<Point>) -> Self {
        self.push(Element::Line {
            points,
            color: BLUE,
            width: 2,
        })
    }

    pub fn draw_segment(self, start: Point, end: Point) -> Self {
        self.push(Element::Segment {
            start,
            end,
            color: BLACK,
            width: 2,
            dashed: false,
        })
    }

    pub fn draw_dashed_segment(self, start: Point, end: Point) -> Self {
        self.push(Element::Segment {
            start,
            end,
            color: BLACK,
            width: 1,
            dashed: true,
        })
    }

    /// Arrow from `start` to `end`; the head is a fifth of the arrow's length.
    pub fn draw_arrow(self, start: Point, end: Point) -> Self {
        self.push_arrow(start, end, BLACK, 2, distance(start, end) / 5.0)
    }

    pub fn draw_circle(self, center: Point, radius: f64, filled: bool) -> Self {
        self.push(Element::Circle {
            center,
            radius,
            color: BLACK,
            filled,
        })
    }

    pub fn draw_arc(self, center: Point, radius: f64, start_deg: f64, end_deg: f64) -> Self {
        self.push(Element::Arc {
            center,
            radius,
            start_deg,
            end_deg,
            color: BLACK,
        })
    }

    pub fn annotate(self, position: Point, text: impl Into<String>) -> Self {
        self.push(Element::Text {
            position,
            text: text.into(),
            size: 16,
            color: BLACK,
        })
    }

    /// Draw a rectangle with rounded corners centred on `center`.
    pub fn draw_rounded_rectangle(
        self,
        center: Point,
        width: f64,
        height: f64,
        corner_radius: f64,
    ) -> Self {
        self.push(Element::Line {
            points: geometry::rounded_rectangle_points(
                center,
                width,
                height,
                corner_radius,
                CORNER_RESOLUTION,
            ),
            color: BLACK,
            width: 1,
        })
    }

    /// Segment with an arrowhead at both ends.
    pub fn draw_double_arrowhead(self, start: Point, end: Point) -> Self {
        self.push_arrow(start, end, BLACK, 1, DOUBLE_HEAD)
            .push_arrow(end, start, BLACK, 1, DOUBLE_HEAD)
    }

    /// Arc labelled at its middle angle, `text_offset` radii beyond the arc.
    ///
    /// Both angles are first wrapped into `[0, 360)`, so an arc from 350 to 10
    /// degrees sweeps backwards through 180.
    pub fn draw_arc_with_text(
        self,
        center: Point,
        radius: f64,
        start_deg: f64,
        end_deg: f64,
        text: impl Into<String>,
        text_offset: f64,
    ) -> Self {
        let (start_deg, end_deg) = (start_deg.rem_euclid(360.0), end_deg.rem_euclid(360.0));
        let label = geometry::arrow_endpoint(
            center,
            (start_deg + end_deg) / 2.0,
            radius * (1.0 + text_offset),
        );
        self.draw_arc(center, radius, start_deg, end_deg).annotate(label, text)
    }

    /// Arrow of `length` leaving `start` at `angle_deg`, with a text label.
    ///
    /// Returns the figure and the arrow's tip.
    ///
    /// # Examples
    /// ```
    /// use mecsimcalc::plot::{ArrowLabel, Figure};
    ///
    /// let figure = Figure::new(200, 200);
    /// let (_, tip) = figure.annotate_arrow((100.0, 200.0), 45.0, 100.0, ArrowLabel::new("F"));
    /// assert!((tip.0 - 170.71067811865476).abs() < 1e-9);
    /// assert!((tip.1 - 270.71067811865476).abs() < 1e-9);
    /// ```
    pub fn annotate_arrow(
        self,
        start: Point,
        angle_deg: f64,
        length: f64,
        label: ArrowLabel,
    ) -> (Self, Point) {
        let tip = geometry::arrow_endpoint(start, angle_deg, length);
        let text_at = if label.centered {
            label.beside(start, tip, angle_deg)
        } else {
            geometry::arrow_endpoint(tip, angle_deg, label.offset.max(0.1 * length))
        };

        let figure = if label.reverse {
            self.draw_arrow(tip, start)
        } else {
            self.draw_arrow(start, tip)
        };
        (figure.annotate(text_at, label.text), tip)
    }

    /// Arrow of `length` pointing at `end` from direction `angle_deg`, with a
    /// text label behind its tail.
    ///
    /// Returns the figure and the arrow's tail.
    pub fn annotate_arrow_end(
        self,
        end: Point,
        angle_deg: f64,
        length: f64,
        label: ArrowLabel,
    ) -> (Self, Point) {
        let tail = geometry::arrow_endpoint(end, angle_deg + 180.0, length);
        let text_at = if label.centered {
            label.beside(tail, end, angle_deg)
        } else {
            geometry::arrow_endpoint(tail, angle_deg + 180.0, label.offset)
        };

        let figure = if label.reverse {
            self.draw_arrow(end, tail)
        } else {
            self.draw_arrow(tail, end)
        };
        (figure.annotate(text_at, label.text), tail)
    }

    /// Arrows from `count` evenly spaced points between `start` and `end`, each
    /// pointing straight down (or up) to `y_origin`.
    pub fn vertical_arrow_rain(
        self,
        count: usize,
        start: Point,
        end: Point,
        y_origin: f64,
    ) -> Self {
        geometry::spaced_points(start, end, count)
            .into_iter()
            .fold(self, |figure, point| {
                let target = (point.0, y_origin);
                figure.push_arrow(point, target, BLUE, 1, distance(point, target) / 5.0)
            })
    }

    /// Arrows from the vertical line `x = x_origin` to `count` evenly spaced
    /// points between `start` and `end`.
    pub fn draw_rain_arrows_horizontal(
        self,
        count: usize,
        x_origin: f64,
        start: Point,
        end: Point,
    ) -> Self {
        geometry::spaced_points(start, end, count)
            .into_iter()
            .fold(self, |figure, point| {
                let origin = (x_origin, point.1);
                figure.push_arrow(origin, point, BLUE, 1, distance(origin, point) / 5.0)
            })
    }

    /// Perspective x/y/z axes: z up, y right and x diagonally towards the viewer.
    pub fn draw_three_axes(self, options: &AxesOptions) -> Self {
        let (l, o) = (options.arrow_length, options.text_offset);
        let d = l / options.depth_factor;

        let mut figure = self
            .without_axes()
            .axis((0.0, l), options)
            .label((0.0, l + o), "z")
            .axis((l, 0.0), options)
            .label((l + o, 0.0), "y");
        if options.negative_y {
            figure = figure.axis((-l, 0.0), options);
        }
        figure = figure
            .axis((-d, -d), options)
            .label((-d - o / 1.5, -d - o / 1.5), "x");
        if options.negative_x {
            figure = figure.axis((d, d), options);
        }
        figure
    }

    /// Plain x/y axes; the x axis is half again as long as the y axis.
    pub fn draw_two_axes(self, options: &AxesOptions) -> Self {
        let (l, o) = (options.arrow_length, options.text_offset);

        let mut figure = self
            .without_axes()
            .axis((0.0, l), options)
            .label((0.0, l + o), "y");
        if options.negative_y {
            figure = figure.axis((0.0, -l), options);
        }
        figure = figure
            .axis((1.5 * l, 0.0), options)
            .label((1.5 * l + o, 0.0), "x");
        if options.negative_x {
            figure = figure.axis((-l, 0.0), options);
        }
        figure
    }

    /// x axis to the right and y axis receding diagonally.
    pub fn draw_two_inclined_axes(self, options: &AxesOptions) -> Self {
        let (l, o) = (options.arrow_length, options.text_offset);
        let d = l / options.depth_factor;

        let mut figure = self
            .without_axes()
            .axis((l, 0.0), options)
            .label((l + o, 0.0), "x");
        if options.negative_x {
            figure = figure.axis((-l, 0.0), options);
        }
        figure = figure
            .axis((d, d), options)
            .label((d + o / 1.5, d + o / 1.5), "y");
        if options.negative_y {
            figure = figure.axis((-d, -d), options);
        }
        figure
    }

    /// Perspective axes with x and y at 30 degrees below the horizontal.
    ///
    /// `negative_x` adds the y axis to the lower right together with the
    /// headless continuation of x; `negative_y` adds the headless continuation
    /// of y.
    pub fn draw_three_axes_rotated(self, options: &AxesOptions) -> Self {
        let (l, o) = (options.arrow_length, options.text_offset);
        let angle = 30f64.to_radians();
        let (c, s) = (
            l * angle.cos() / options.depth_factor,
            l * angle.sin() / options.depth_factor,
        );

        let mut figure = self
            .without_axes()
            .axis((0.0, l), options)
            .label((0.0, l + o), "z")
            .axis((-c, -s), options)
            .label((-c - o, -s - o), "x");
        if options.negative_x {
            figure = figure
                .axis_line((c, s), options)
                .axis((c, -s), options)
                .label((c + 2.0 * o / 1.5, -s - o / 1.5), "y");
        }
        if options.negative_y {
            figure = figure.axis_line((-c, s), options);
        }
        figure
    }

    fn push_arrow(
        self,
        start: Point,
        end: Point,
        color: RGBColor,
        width: u32,
        head_length: f64,
    ) -> Self {
        self.push(Element::Arrow {
            start,
            end,
            color,
            width,
            head_length,
        })
    }

    // Axis arrow leaving the origin.
    fn axis(self, end: Point, options: &AxesOptions) -> Self {
        self.push_arrow((0.0, 0.0), end, AXIS_GRAY, options.thickness, AXIS_HEAD)
    }

    fn axis_line(self, end: Point, options: &AxesOptions) -> Self {
        self.push(Element::Segment {
            start: (0.0, 0.0),
            end,
            color: AXIS_GRAY,
            width: options.thickness,
            dashed: false,
        })
    }

    fn label(self, position: Point, text: &str) -> Self {
        self.push(Element::Text {
            position,
            text: text.to_string(),
            size: 12,
            color: BLACK,
        })
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Axis ranges: the explicit ones, or the elements' extent padded by 5%.
    pub fn ranges(&self) -> (Range<f64>, Range<f64>) {
        let points: Vec<Point> = self.elements.iter().flat_map(Element::extent).collect();
        let x = self
            .x_range
            .clone()
            .unwrap_or_else(|| padded(points.iter().map(|p| p.0)));
        let y = self
            .y_range
            .clone()
            .unwrap_or_else(|| padded(points.iter().map(|p| p.1)));
        (x, y)
    }

    /// Render the figure into an RGB pixel buffer.
    pub fn render_rgb(&self) -> Result<RgbImage, PlotError> {
        let mut buffer = vec![0u8; (self.width as usize) * (self.height as usize) * 3];
        self.draw_into(&mut buffer).map_err(PlotError::Draw)?;

        RgbImage::from_raw(self.width, self.height, buffer).ok_or(PlotError::Buffer {
            width: self.width,
            height: self.height,
        })
    }

    /// Render the figure as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>, PlotError> {
        let image = DynamicImage::ImageRgb8(self.render_rgb()?);
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageOutputFormat::Png)?;
        Ok(bytes.into_inner())
    }

    fn draw_into(&self, buffer: &mut [u8]) -> Result<(), String> {
        let root = BitMapBackend::with_buffer(buffer, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let (x_range, y_range) = self.ranges();

        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if let Some(title) = &self.title {
            builder.caption(title, ("sans-serif", 30).into_font());
        }
        if self.show_axes {
            builder.x_label_area_size(30).y_label_area_size(40);
        }
        let mut chart = builder
            .build_cartesian_2d(x_range, y_range)
            .map_err(|e| e.to_string())?;

        if self.show_axes {
            chart
                .configure_mesh()
                .x_desc(self.x_label.as_str())
                .y_desc(self.y_label.as_str())
                .draw()
                .map_err(|e| e.to_string())?;
        }

        for element in &self.elements {
            match element {
                Element::Line {
                    points,
                    color,
                    width,
                } => {
                    chart
                        .draw_series(LineSeries::new(
                            points.iter().copied(),
                            color.stroke_width(*width),
                        ))
                        .map_err(|e| e.to_string())?;
                }
                Element::Segment {
                    start,
                    end,
                    color,
                    width,
                    dashed,
                } => {
                    let pieces = if *dashed {
                        dashes(*start, *end)
                    } else {
                        vec![(*start, *end)]
                    };
                    chart
                        .draw_series(pieces.into_iter().map(|(a, b)| {
                            PathElement::new(vec![a, b], color.stroke_width(*width))
                        }))
                        .map_err(|e| e.to_string())?;
                }
                Element::Arrow {
                    start,
                    end,
                    color,
                    width,
                    head_length,
                } => {
                    let heading = geometry::angle_between(*start, *end);
                    let left = geometry::arrow_endpoint(*end, heading + 150.0, *head_length);
                    let right = geometry::arrow_endpoint(*end, heading - 150.0, *head_length);
                    let style = color.stroke_width(*width);
                    chart
                        .draw_series([
                            PathElement::new(vec![*start, *end], style),
                            PathElement::new(vec![left, *end, right], style),
                        ])
                        .map_err(|e| e.to_string())?;
                }
                Element::Circle {
                    center,
                    radius,
                    color,
                    filled,
                } => {
                    let outline =
                        geometry::arc_points(*center, *radius, 0.0, 360.0, ARC_RESOLUTION);
                    if *filled {
                        chart
                            .draw_series(std::iter::once(Polygon::new(outline, color.filled())))
                            .map_err(|e| e.to_string())?;
                    } else {
                        chart
                            .draw_series(std::iter::once(PathElement::new(
                                outline,
                                color.stroke_width(1),
                            )))
                            .map_err(|e| e.to_string())?;
                    }
                }
                Element::Arc {
                    center,
                    radius,
                    start_deg,
                    end_deg,
                    color,
                } => {
                    let points = geometry::arc_points(
                        *center,
                        *radius,
                        *start_deg,
                        *end_deg,
                        ARC_RESOLUTION,
                    );
                    chart
                        .draw_series(std::iter::once(PathElement::new(
                            points,
                            color.stroke_width(1),
                        )))
                        .map_err(|e| e.to_string())?;
                }
                Element::Text {
                    position,
                    text,
                    size,
                    color,
                } => {
                    let style = ("sans-serif", *size).into_font().color(color);
                    chart
                        .draw_series(std::iter::once(Text::new(text.clone(), *position, style)))
                        .map_err(|e| e.to_string())?;
                }
            }
        }

        root.present().map_err(|e| e.to_string())?;
        Ok(())
    }
}

fn distance(a: Point, b: Point) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

fn padded(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if min > max {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

// Split a segment into 20 dash/gap pairs.
fn dashes(start: Point, end: Point) -> Vec<(Point, Point)> {
    const PAIRS: usize = 20;
    let step = ((end.0 - start.0) / (2 * PAIRS) as f64, (end.1 - start.1) / (2 * PAIRS) as f64);
    let at = |i: usize| (start.0 + step.0 * i as f64, start.1 + step.1 * i as f64);

    (0..PAIRS).map(|k| (at(2 * k), at(2 * k + 1))).collect()
}

/// Layout of the coordinate-axis diagrams drawn by [`Figure::draw_three_axes`]
/// and its siblings
#[derive(Clone, Debug)]
pub struct AxesOptions {
    /// Length of each axis arrow, in figure units
    pub arrow_length: f64,

    /// Stroke width of the axes in pixels
    pub thickness: u32,

    /// Distance between an arrow tip and its label
    pub text_offset: f64,

    /// Divisor that shortens the receding (diagonal) axis
    pub depth_factor: f64,

    /// Also draw the negative x direction
    pub negative_x: bool,

    /// Also draw the negative y direction
    pub negative_y: bool,
}

impl Default for AxesOptions {
    fn default() -> Self {
        Self {
            arrow_length: 1.0,
            thickness: 2,
            text_offset: 0.1,
            depth_factor: 1.5,
            negative_x: false,
            negative_y: false,
        }
    }
}

/// Text attached to an annotated arrow
#[derive(Clone, Debug)]
pub struct ArrowLabel {
    pub text: String,

    /// Distance between the arrow and the text
    pub offset: f64,

    /// Point the head back at the anchor point
    pub reverse: bool,

    /// Put the text beside the middle of the shaft instead of past its end
    pub centered: bool,
}

impl ArrowLabel {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            offset: 0.1,
            reverse: false,
            centered: false,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.centered = true;
        self
    }

    // Left of the shaft's midpoint, seen along the arrow.
    fn beside(&self, start: Point, end: Point, angle_deg: f64) -> Point {
        geometry::arrow_endpoint(geometry::midpoint(start, end), angle_deg + 90.0, self.offset)
    }
}

/// Configuration options for plot rendering
#[derive(Clone, Debug)]
pub struct PlotOptions {
    /// Display width of the `<img>` tag in pixels
    pub width: u32,

    /// Also produce a download link for the PNG
    pub download: bool,

    /// Text of the download link
    pub download_text: String,

    /// File name of the download, without extension
    pub download_file_name: String,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 500,
            download: false,
            download_text: "Download Plot".to_string(),
            download_file_name: "myplot".to_string(),
        }
    }
}

/// Render a figure as an HTML `<img>` with an optional PNG download link.
pub fn render_plot(figure: &Figure, options: &PlotOptions) -> Result<RenderedHtml, PlotError> {
    let encoded = codec::encode("image/png", &figure.to_png()?);
    let html = img_tag(&encoded, Some(options.width));

    if !options.download {
        return Ok(RenderedHtml::new(html));
    }

    let file_name = format!("{}.png", options.download_file_name);
    let link = download_anchor(&encoded, &file_name, &options.download_text);
    Ok(RenderedHtml::with_download(html, link))
}

/// Render a sequence of figures as a looping GIF `<img>`.
///
/// Every frame is shown for `1000 / fps` milliseconds. All frames must share
/// one size.
pub fn render_animation(frames: &[Figure], fps: u32) -> Result<String, PlotError> {
    if frames.is_empty() {
        return Err(PlotError::NoFrames);
    }
    if fps == 0 {
        return Err(PlotError::InvalidFrameRate);
    }

    let size = frames[0].size();
    if let Some(index) = frames.iter().position(|figure| figure.size() != size) {
        return Err(PlotError::FrameSize { index });
    }

    let delay = Delay::from_numer_denom_ms(1000, fps);
    let rendered = frames
        .iter()
        .map(|figure| -> Result<Frame, PlotError> {
            let rgba = DynamicImage::ImageRgb8(figure.render_rgb()?).to_rgba8();
            Ok(Frame::from_parts(rgba, 0, 0, delay))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut gif = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut gif);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(rendered)?;
    }

    Ok(format!(
        "<img src='{}' />",
        codec::encode("image/gif", &gif)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> Figure {
        Figure::new(120, 80).without_axes()
    }

    #[test]
    fn ranges_follow_elements() {
        let figure = blank().draw_segment((0.0, -2.0), (10.0, 2.0));
        let (x, y) = figure.ranges();
        assert!((x.start + 0.5).abs() < 1e-9 && (x.end - 10.5).abs() < 1e-9);
        assert!((y.start + 2.2).abs() < 1e-9 && (y.end - 2.2).abs() < 1e-9);
    }

    #[test]
    fn explicit_ranges_win() {
        let figure = blank()
            .with_x_range(0.0..1.0)
            .with_y_range(-1.0..1.0)
            .draw_segment((0.0, 0.0), (5.0, 5.0));
        assert_eq!(figure.ranges(), (0.0..1.0, -1.0..1.0));
    }

    #[test]
    fn empty_and_degenerate_ranges() {
        assert_eq!(blank().ranges(), (0.0..1.0, 0.0..1.0));
        let point = blank().plot_line(vec![(3.0, 3.0)]);
        assert_eq!(point.ranges(), (2.0..4.0, 2.0..4.0));
    }

    #[test]
    fn dashes_cover_half_the_segment() {
        let pieces = dashes((0.0, 0.0), (4.0, 0.0));
        assert_eq!(pieces.len(), 20);
        assert_eq!(pieces[0], ((0.0, 0.0), (0.1, 0.0)));
        let covered: f64 = pieces.iter().map(|(a, b)| b.0 - a.0).sum();
        assert!((covered - 2.0).abs() < 1e-9);
    }

    #[test]
    fn renders_shapes_to_pixels() {
        let figure = blank()
            .with_x_range(0.0..10.0)
            .with_y_range(0.0..10.0)
            .draw_circle((5.0, 5.0), 3.0, true)
            .draw_arrow((1.0, 1.0), (9.0, 9.0))
            .draw_dashed_segment((0.0, 9.0), (10.0, 9.0))
            .draw_arc((5.0, 5.0), 4.0, 0.0, 180.0);
        let image = figure.render_rgb().unwrap();
        assert_eq!(image.dimensions(), (120, 80));
        assert!(image.pixels().any(|p| p.0 != [255, 255, 255]));
    }

    #[test]
    fn plot_html_and_download() {
        let figure = blank().plot_line(vec![(0.0, 0.0), (1.0, 2.0)]);
        let options = PlotOptions {
            download: true,
            ..PlotOptions::default()
        };
        let rendered = render_plot(&figure, &options).unwrap();
        assert!(rendered.html.starts_with("<img src='data:image/png;base64,"));
        assert!(rendered.html.ends_with("width='500'>"));
        let link = rendered.download_link.unwrap();
        assert!(link.ends_with("download='myplot.png'>Download Plot</a>"));
    }

    #[test]
    fn animation_is_gif() {
        let frames: Vec<Figure> = (0..3)
            .map(|i| {
                blank()
                    .with_x_range(0.0..3.0)
                    .with_y_range(0.0..3.0)
                    .draw_segment((0.0, 0.0), (i as f64, 3.0))
            })
            .collect();
        let html = render_animation(&frames, 10).unwrap();
        assert!(html.starts_with("<img src='data:image/gif;base64,R0lGOD"));
        assert!(html.ends_with("' />"));
    }

    #[test]
    fn animation_rejects_bad_input() {
        assert!(matches!(render_animation(&[], 10), Err(PlotError::NoFrames)));
        assert!(matches!(
            render_animation(&[blank()], 0),
            Err(PlotError::InvalidFrameRate)
        ));
    }

    fn close(a: Point, b: Point) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    fn arrows(figure: &Figure) -> Vec<(Point, Point)> {
        figure
            .elements()
            .iter()
            .filter_map(|element| match element {
                Element::Arrow { start, end, .. } => Some((*start, *end)),
                _ => None,
            })
            .collect()
    }

    fn labels(figure: &Figure) -> Vec<(Point, String)> {
        figure
            .elements()
            .iter()
            .filter_map(|element| match element {
                Element::Text { position, text, .. } => Some((*position, text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn three_axes_with_negative_directions() {
        let options = AxesOptions {
            negative_x: true,
            negative_y: true,
            ..AxesOptions::default()
        };
        let figure = Figure::new(200, 200).draw_three_axes(&options);

        let ends: Vec<Point> = arrows(&figure).into_iter().map(|(_, end)| end).collect();
        assert_eq!(ends.len(), 5);
        assert!(close(ends[0], (0.0, 1.0)));
        assert!(close(ends[1], (1.0, 0.0)));
        assert!(close(ends[2], (-1.0, 0.0)));
        assert!(close(ends[3], (-1.0 / 1.5, -1.0 / 1.5)));
        assert!(close(ends[4], (1.0 / 1.5, 1.0 / 1.5)));

        let names: Vec<String> = labels(&figure).into_iter().map(|(_, text)| text).collect();
        assert_eq!(names, ["z", "y", "x"]);
        assert!(!figure.show_axes);
    }

    #[test]
    fn two_axes_stretch_x() {
        let figure = Figure::new(200, 200).draw_two_axes(&AxesOptions::default());
        let ends: Vec<Point> = arrows(&figure).into_iter().map(|(_, end)| end).collect();
        assert_eq!(ends, vec![(0.0, 1.0), (1.5, 0.0)]);
        assert!(close(labels(&figure)[1].0, (1.6, 0.0)));
    }

    #[test]
    fn inclined_axes_recede_diagonally() {
        let figure = Figure::new(200, 200).draw_two_inclined_axes(&AxesOptions {
            depth_factor: 2.0,
            ..AxesOptions::default()
        });
        let ends: Vec<Point> = arrows(&figure).into_iter().map(|(_, end)| end).collect();
        assert_eq!(ends, vec![(1.0, 0.0), (0.5, 0.5)]);
    }

    #[test]
    fn rotated_axes_sit_thirty_degrees_down() {
        let options = AxesOptions {
            depth_factor: 1.0,
            negative_x: true,
            negative_y: true,
            ..AxesOptions::default()
        };
        let figure = Figure::new(200, 200).draw_three_axes_rotated(&options);

        let ends: Vec<Point> = arrows(&figure).into_iter().map(|(_, end)| end).collect();
        let (c, s) = (30f64.to_radians().cos(), 30f64.to_radians().sin());
        assert_eq!(ends.len(), 3);
        assert!(close(ends[1], (-c, -s)));
        assert!(close(ends[2], (c, -s)));

        let headless = figure
            .elements()
            .iter()
            .filter(|element| matches!(element, Element::Segment { .. }))
            .count();
        assert_eq!(headless, 2);
    }

    #[test]
    fn annotated_arrow_returns_tip() {
        let (figure, tip) =
            blank().annotate_arrow((100.0, 200.0), 45.0, 100.0, ArrowLabel::new("F"));
        assert!(close(tip, (170.71067811865476, 270.71067811865476)));

        assert_eq!(arrows(&figure), vec![((100.0, 200.0), tip)]);
        let (position, text) = labels(&figure).remove(0);
        assert_eq!(text, "F");
        // Beyond the tip by a tenth of the length
        assert!((distance(tip, position) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn reversed_centered_label() {
        let label = ArrowLabel::new("w").with_offset(1.0).reversed().centered();
        let (figure, tip) = blank().annotate_arrow((0.0, 0.0), 0.0, 4.0, label);

        assert_eq!(arrows(&figure), vec![(tip, (0.0, 0.0))]);
        assert!(close(labels(&figure)[0].0, (2.0, 1.0)));
    }

    #[test]
    fn arrow_end_returns_tail() {
        let (figure, tail) = blank().annotate_arrow_end(
            (20.0, 20.0),
            45.0,
            10.0,
            ArrowLabel::new("P").with_offset(0.5),
        );
        let step = 10.0 / 2f64.sqrt();
        assert!(close(tail, (20.0 - step, 20.0 - step)));
        assert_eq!(arrows(&figure), vec![(tail, (20.0, 20.0))]);
        assert!((distance(tail, labels(&figure)[0].0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn double_arrowhead_points_both_ways() {
        let figure = blank().draw_double_arrowhead((0.0, 0.0), (2.0, 0.0));
        assert_eq!(
            arrows(&figure),
            vec![((0.0, 0.0), (2.0, 0.0)), ((2.0, 0.0), (0.0, 0.0))]
        );
    }

    #[test]
    fn arc_label_sits_outside_middle_angle() {
        let figure = blank().draw_arc_with_text((0.0, 0.0), 2.0, 0.0, 90.0, "θ", 0.5);
        let (position, text) = labels(&figure).remove(0);
        assert_eq!(text, "θ");
        let expected = geometry::arrow_endpoint((0.0, 0.0), 45.0, 3.0);
        assert!(close(position, expected));
    }

    #[test]
    fn rounded_rectangle_is_one_closed_line() {
        let figure = blank().draw_rounded_rectangle((0.0, 0.0), 4.0, 2.0, 0.5);
        match figure.elements() {
            [Element::Line { points, .. }] => assert_eq!(points.first(), points.last()),
            other => panic!("expected a single line, got {other:?}"),
        }
        assert!(figure.render_rgb().is_ok());
    }

    #[test]
    fn rain_arrows_reach_their_origin() {
        let figure = blank().vertical_arrow_rain(4, (0.0, 10.0), (3.0, 13.0), 0.0);
        let drops = arrows(&figure);
        assert_eq!(drops.len(), 4);
        assert!(drops.iter().all(|(start, end)| end.1 == 0.0 && start.0 == end.0));
        assert_eq!(drops[3].0, (3.0, 13.0));

        let figure = blank().draw_rain_arrows_horizontal(3, -1.0, (2.0, 0.0), (4.0, 2.0));
        let pushes = arrows(&figure);
        assert_eq!(
            pushes,
            vec![
                ((-1.0, 0.0), (2.0, 0.0)),
                ((-1.0, 1.0), (3.0, 1.0)),
                ((-1.0, 2.0), (4.0, 2.0)),
            ]
        );
    }

    #[test]
    fn animation_frames_must_share_size() {
        let frames = [blank(), Figure::new(60, 40).without_axes()];
        assert_eq!(frames[1].size(), (60, 40));
        assert!(matches!(
            render_animation(&frames, 5),
            Err(PlotError::FrameSize { index: 1 })
        ));
    }
}

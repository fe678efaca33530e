use std::collections::HashMap;
use std::sync::Arc;

use image::DynamicImage;
use shared::Classifications;

/// Cheaply clonable handle to a decoded input image.
#[derive(Debug, Clone)]
pub struct Image(Arc<DynamicImage>);

impl Image {
    pub fn new(image: DynamicImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.0
    }
}

impl From<DynamicImage> for Image {
    fn from(image: DynamicImage) -> Self {
        Image::new(image)
    }
}

/// Rectangle in normalized image coordinates, rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRect {
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
}

impl Default for NormalizedRect {
    fn default() -> Self {
        Self {
            x_center: 0.5,
            y_center: 0.5,
            width: 1.0,
            height: 1.0,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Packet {
    Image(Image),
    NormalizedRect(NormalizedRect),
    Classifications(Vec<Classifications>),
}

impl Packet {
    pub fn type_name(&self) -> &'static str {
        match self {
            Packet::Image(_) => "Image",
            Packet::NormalizedRect(_) => "NormalizedRect",
            Packet::Classifications(_) => "Classifications",
        }
    }
}

/// Packets keyed by input stream name.
pub type InputPackets = HashMap<String, Packet>;

/// One packet per declared output stream, in declaration order.
#[derive(Debug, Clone)]
pub struct OutputPackets {
    pub timestamp_ms: u64,
    pub packets: Vec<Packet>,
}

impl OutputPackets {
    pub fn new(timestamp_ms: u64, packets: Vec<Packet>) -> Self {
        Self {
            timestamp_ms,
            packets,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Packet> {
        self.packets.get(index)
    }
}

//! Binary model files.
//!
//! All values are little-endian, with no padding. The body is:
//!
//! ```text
//! u64 layer_count
//! layer_count × i32 layer sizes
//! f64 learning_rate
//! per transition: per output neuron an f64 weight row, then the f64 bias vector
//! ```
//!
//! [`save`](crate::Network::save) prefixes the body with a header
//! (`b"FFNN"`, `u32` format version, `u64` FNV-1a checksum of the layer
//! sizes). Headerless files are still accepted on load. Either way the file
//! length must match the declared shapes exactly.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{info, warn};

use crate::activation::activation::Activation;
use crate::error::{NetworkError, Result};
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::network::network::{validate_sizes, warn_on_hidden_fallback, Network};
use crate::optim::sgd::Sgd;

pub const MAGIC: [u8; 4] = *b"FFNN";
pub const FORMAT_VERSION: u32 = 1;

const F64_BYTES: usize = 8;

/// Which layout a decoded file used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Bare body without magic, version or checksum.
    Legacy,
    Versioned(u32),
}

/// Parameters recovered from a model file.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub format: Format,
    pub layer_sizes: Vec<usize>,
    pub learning_rate: f64,
    pub layers: Vec<Layer>,
}

impl Decoded {
    pub fn into_network(self, activation: Activation) -> Network {
        warn_on_hidden_fallback(activation);
        Network {
            layer_sizes: self.layer_sizes,
            layers: self.layers,
            activation,
            optimizer: Sgd::new(self.learning_rate),
        }
    }
}

/// FNV-1a over the sizes as they are written (i32, little-endian).
pub fn shape_checksum(layer_sizes: &[usize]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    layer_sizes
        .iter()
        .flat_map(|&s| (s as i32).to_le_bytes())
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

/// Encodes `network` with the versioned header.
pub fn encode(network: &Network) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + body_len(network));
    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&shape_checksum(&network.layer_sizes).to_le_bytes());
    write_body(network, &mut buf);
    buf
}

/// Encodes `network` as a bare body.
pub fn encode_legacy(network: &Network) -> Vec<u8> {
    let mut buf = Vec::with_capacity(body_len(network));
    write_body(network, &mut buf);
    buf
}

fn body_len(network: &Network) -> usize {
    8 + 4 * network.layer_sizes.len() + F64_BYTES * (1 + network.parameter_count())
}

fn write_body(network: &Network, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&(network.layer_sizes.len() as u64).to_le_bytes());
    for &size in &network.layer_sizes {
        buf.extend_from_slice(&(size as i32).to_le_bytes());
    }
    buf.extend_from_slice(&network.learning_rate().to_le_bytes());

    for layer in &network.layers {
        for row in &layer.weights.data {
            for w in row {
                buf.extend_from_slice(&w.to_le_bytes());
            }
        }
        for b in &layer.biases {
            buf.extend_from_slice(&b.to_le_bytes());
        }
    }
}

/// Decodes a model file, detecting the layout by its first bytes.
pub fn decode(bytes: &[u8]) -> Result<Decoded> {
    let mut reader = ByteReader::new(bytes);

    if bytes.starts_with(&MAGIC) {
        reader.take(MAGIC.len(), "magic")?;
        let version = reader.u32("format version")?;
        if version != FORMAT_VERSION {
            return Err(NetworkError::CorruptModel(format!(
                "unsupported format version {version} (expected {FORMAT_VERSION})"
            )));
        }
        let checksum = reader.u64("shape checksum")?;
        let decoded = read_body(&mut reader, Format::Versioned(version))?;
        let actual = shape_checksum(&decoded.layer_sizes);
        if actual != checksum {
            return Err(NetworkError::CorruptModel(format!(
                "shape checksum mismatch: header {checksum:#018x}, sizes give {actual:#018x}"
            )));
        }
        Ok(decoded)
    } else {
        read_body(&mut reader, Format::Legacy)
    }
}

fn read_body(reader: &mut ByteReader<'_>, format: Format) -> Result<Decoded> {
    let count = reader.u64("layer count")?;
    let count = usize::try_from(count)
        .ok()
        .filter(|&c| c.checked_mul(4).is_some_and(|n| n <= reader.remaining()))
        .ok_or_else(|| {
            NetworkError::CorruptModel(format!(
                "declared {count} layers but only {} bytes remain",
                reader.remaining()
            ))
        })?;

    let mut layer_sizes = Vec::with_capacity(count);
    for idx in 0..count {
        let size = reader.i32("layer size")?;
        let size = usize::try_from(size).map_err(|_| {
            NetworkError::CorruptModel(format!("layer {idx} has negative size {size}"))
        })?;
        layer_sizes.push(size);
    }
    validate_sizes(&layer_sizes)
        .map_err(|e| NetworkError::CorruptModel(format!("bad layer sizes: {e}")))?;

    let learning_rate = reader.f64("learning rate")?;

    let expected_values = layer_sizes
        .windows(2)
        .try_fold(0usize, |acc, pair| {
            pair[1]
                .checked_mul(pair[0])
                .and_then(|w| w.checked_add(pair[1]))
                .and_then(|n| acc.checked_add(n))
        })
        .and_then(|n| n.checked_mul(F64_BYTES))
        .ok_or_else(|| NetworkError::CorruptModel("declared shapes overflow".into()))?;
    if expected_values != reader.remaining() {
        return Err(NetworkError::CorruptModel(format!(
            "declared shapes need {expected_values} parameter bytes, file has {}",
            reader.remaining()
        )));
    }

    let mut layers = Vec::with_capacity(count - 1);
    for pair in layer_sizes.windows(2) {
        let (inputs, outputs) = (pair[0], pair[1]);
        let mut data = Vec::with_capacity(outputs);
        for _ in 0..outputs {
            data.push(reader.f64_vec(inputs, "weight row")?);
        }
        let biases = reader.f64_vec(outputs, "bias vector")?;
        layers.push(Layer {
            weights: Matrix {
                rows: outputs,
                cols: inputs,
                data,
            },
            biases,
        });
    }

    Ok(Decoded {
        format,
        layer_sizes,
        learning_rate,
        layers,
    })
}

/// Bounds-checked little-endian cursor.
struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(NetworkError::CorruptModel(format!(
                "truncated while reading {what}: need {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let buf: &'a [u8] = self.buf;
        let slice = &buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array(what)?))
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array(what)?))
    }

    fn i32(&mut self, what: &str) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array(what)?))
    }

    fn f64(&mut self, what: &str) -> Result<f64> {
        Ok(f64::from_le_bytes(self.array(what)?))
    }

    fn f64_vec(&mut self, len: usize, what: &str) -> Result<Vec<f64>> {
        let bytes = self.take(len * F64_BYTES, what)?;
        Ok(bytes
            .chunks_exact(F64_BYTES)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect())
    }
}

impl Network {
    /// Writes the network to `path` in the versioned layout.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_file(path.as_ref(), &encode(self))
    }

    /// Writes the network to `path` without the versioned header.
    pub fn save_legacy(&self, path: impl AsRef<Path>) -> Result<()> {
        write_file(path.as_ref(), &encode_legacy(self))
    }

    /// Replaces layer sizes, learning rate and parameters with those stored
    /// in `path`. The activation choice is kept.
    ///
    /// The whole file is decoded and validated first; on any error the
    /// network is left exactly as it was.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let decoded = read_file(path)?;
        let Decoded {
            layer_sizes,
            learning_rate,
            layers,
            ..
        } = decoded;
        self.layer_sizes = layer_sizes;
        self.layers = layers;
        self.optimizer = Sgd::new(learning_rate);
        Ok(())
    }

    /// Builds a network from a model file.
    pub fn from_file(path: impl AsRef<Path>, activation: Activation) -> Result<Network> {
        Ok(read_file(path.as_ref())?.into_network(activation))
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    info!("model saved to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn read_file(path: &Path) -> Result<Decoded> {
    let decoded = fs::read(path)
        .map_err(NetworkError::from)
        .and_then(|bytes| decode(&bytes))
        .inspect_err(|e| warn!("could not load model from {}: {e}", path.display()))?;
    info!(
        "model loaded from {} ({:?}, sizes {:?})",
        path.display(),
        decoded.format,
        decoded.layer_sizes
    );
    Ok(decoded)
}

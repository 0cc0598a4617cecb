use std::io;

use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use crate::{Deserialize, Serialize, specs::machine_learning::LocalModelSpec};

type Header = u32;
const HEADER_SIZE: usize = size_of::<Header>();
const MODEL_KIND: Header = 1;
const PARAM_SIZE: usize = size_of::<f64>();

/// Everything a released model carries: its hyperparameters, the carried step size and
/// the parameter vector. Never holds any sample of the data it was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelState {
    pub spec: LocalModelSpec,
    pub step: f64,
    pub params: Vec<f64>,
}

#[derive(SerdeSerialize, SerdeDeserialize)]
struct StateHeader {
    spec: LocalModelSpec,
    step: f64,
    dim: usize,
}

/// An opaque serialized model, the unit exchanged between clients and the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBlob(Vec<u8>);

impl ModelBlob {
    /// Wraps already encoded bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Encodes a model state into a new blob.
    ///
    /// # Arguments
    /// * `state` - The state to encode.
    ///
    /// # Returns
    /// The blob or an io error if the header can't be encoded.
    pub fn encode(state: &ModelState) -> io::Result<Self> {
        let mut buf = Vec::with_capacity(2 * HEADER_SIZE + state.params.len() * PARAM_SIZE);
        state.serialize(&mut buf)?;
        Ok(Self(buf))
    }

    /// Decodes the model state held by this blob.
    pub fn decode(&self) -> io::Result<ModelState> {
        ModelState::deserialize(&self.0)
    }
}

impl ModelState {
    fn invalid_data<T>(msg: String) -> io::Result<T> {
        Err(io::Error::new(io::ErrorKind::InvalidData, msg))
    }

    fn read_header(buf: &[u8]) -> io::Result<(Header, &[u8])> {
        if buf.len() < HEADER_SIZE {
            return Self::invalid_data(format!(
                "The given buffer is too small {}, must at least be {HEADER_SIZE} bytes",
                buf.len()
            ));
        }

        let (head, rest) = buf.split_at(HEADER_SIZE);
        let mut bytes = [0; HEADER_SIZE];
        bytes.copy_from_slice(head);
        Ok((Header::from_be_bytes(bytes), rest))
    }
}

// Layout: kind | header length | json header | native endian f64 parameters.
impl Serialize for ModelState {
    fn serialize(&self, buf: &mut Vec<u8>) -> io::Result<()> {
        let header = StateHeader {
            spec: self.spec.clone(),
            step: self.step,
            dim: self.params.len(),
        };

        let json = serde_json::to_vec(&header)?;
        let json_len = Header::try_from(json.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        buf.extend_from_slice(&MODEL_KIND.to_be_bytes());
        buf.extend_from_slice(&json_len.to_be_bytes());
        buf.extend_from_slice(&json);
        buf.extend_from_slice(bytemuck::cast_slice(self.params.as_slice()));
        Ok(())
    }
}

impl Deserialize<'_> for ModelState {
    fn deserialize(buf: &[u8]) -> io::Result<Self> {
        let (kind, rest) = Self::read_header(buf)?;
        if kind != MODEL_KIND {
            return Self::invalid_data(format!("Received an invalid kind {kind}"));
        }

        let (json_len, rest) = Self::read_header(rest)?;
        let json_len = json_len as usize;
        if rest.len() < json_len {
            return Self::invalid_data(format!(
                "The model header claims {json_len} bytes but only {} remain",
                rest.len()
            ));
        }

        let (json, params) = rest.split_at(json_len);
        let header: StateHeader = serde_json::from_slice(json)?;

        let Some(expected) = header.dim.checked_mul(PARAM_SIZE) else {
            return Self::invalid_data(format!(
                "The model header claims {} parameters",
                header.dim
            ));
        };

        if params.len() != expected {
            return Self::invalid_data(format!(
                "Expected {expected} parameter bytes, got {}",
                params.len()
            ));
        }

        // The parameter bytes may sit at any offset, so they are copied out instead of cast.
        let params: Vec<f64> = bytemuck::pod_collect_to_vec(params);

        Ok(Self {
            spec: header.spec,
            step: header.step,
            params,
        })
    }
}

//! ONNX Back-end - ONNX Runtime Integration
//!
//! Runs classifiers converted with skl2onnx / onnxmltools. The input is a
//! single `[1, n]` float tensor; the class-1 column of the probability
//! output is used when the graph exposes it as a tensor, otherwise only
//! the hard label is available.

use ndarray::Array2;
use parking_lot::Mutex;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Value;

use super::types::{AlgorithmKind, InferenceError, RawScore, ThreatModel};

/// Output names emitted by the sklearn/lightgbm/xgboost converters
const PROBABILITY_OUTPUTS: &[&str] = &["probabilities", "output_probability"];
const LABEL_OUTPUTS: &[&str] = &["label", "output_label"];

/// ONNX classifier session
pub struct OnnxModel {
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    algorithm: AlgorithmKind,
    input_len: usize,
    threshold: f32,
    probability_output: Option<String>,
    label_output: Option<String>,
}

impl OnnxModel {
    /// Build a session from artifact bytes already read (and checksummed)
    pub fn from_bytes(
        bytes: &[u8],
        algorithm: AlgorithmKind,
        input_len: usize,
        threshold: f32,
    ) -> Result<Self, String> {
        let session = Session::builder()
            .map_err(|e| format!("Session builder error: {}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| format!("Optimization error: {}", e))?
            .commit_from_memory(bytes)
            .map_err(|e| format!("Load from memory error: {}", e))?;

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let find = |candidates: &[&str]| {
            output_names.iter().find(|n| candidates.contains(&n.as_str())).cloned()
        };
        let probability_output = find(PROBABILITY_OUTPUTS);
        let label_output = find(LABEL_OUTPUTS);

        if probability_output.is_none() && label_output.is_none() {
            return Err(format!("No label or probability output (outputs: {:?})", output_names));
        }

        Ok(Self {
            session: Mutex::new(session),
            algorithm,
            input_len,
            threshold,
            probability_output,
            label_output,
        })
    }
}

impl ThreatModel for OnnxModel {
    fn algorithm(&self) -> AlgorithmKind {
        self.algorithm
    }

    fn input_len(&self) -> usize {
        self.input_len
    }

    fn backend(&self) -> &'static str {
        "onnx"
    }

    fn predict(&self, input: &[f32]) -> Result<RawScore, InferenceError> {
        if input.len() != self.input_len {
            return Err(InferenceError::InputLength {
                expected: self.input_len,
                actual: input.len(),
            });
        }

        let input_array = Array2::<f32>::from_shape_vec((1, input.len()), input.to_vec())
            .map_err(|e| InferenceError::Runtime(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError::Runtime(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Runtime(format!("Inference failed: {}", e)))?;

        // Probability tensor (zipmap disabled at conversion time)
        if let Some(name) = &self.probability_output {
            if let Some(output) = outputs.get(name.as_str()) {
                if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
                    let probability = match data.len() {
                        0 => None,
                        1 => Some(data[0]),
                        _ => Some(data[1]),
                    };
                    if let Some(p) = probability {
                        if !p.is_finite() {
                            return Err(InferenceError::NonFiniteOutput);
                        }
                        return Ok(RawScore::from_probability(p, self.threshold));
                    }
                }
            }
        }

        // Degraded: hard label only
        let name = self.label_output.as_deref()
            .ok_or_else(|| InferenceError::Runtime("Probability output unreadable".to_string()))?;
        let output = outputs.get(name)
            .ok_or_else(|| InferenceError::Runtime(format!("Missing output '{}'", name)))?;
        let (_, labels) = output.try_extract_tensor::<i64>()
            .map_err(|e| InferenceError::Runtime(format!("Extract error: {}", e)))?;
        let label = labels.first().copied()
            .ok_or_else(|| InferenceError::Runtime("Empty label output".to_string()))?;

        Ok(RawScore::hard_label(label == 1))
    }
}

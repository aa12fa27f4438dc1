use serde::{Deserialize, Serialize};
use std::f64::consts::E;
use std::fmt;
use std::str::FromStr;

/// Non-linearity chosen when a network is built.
///
/// Hidden layers apply [`Activation::hidden_strategy`] element-wise; the output
/// layer always applies [`softmax`], whatever the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Sigmoid,
    #[serde(rename = "relu")]
    ReLU,
    Tanh,
    /// Softmax is a vector-valued activation reserved for the output layer.
    /// Element-wise it acts as the identity so a combined softmax +
    /// cross-entropy delta passes through the backward step unchanged.
    Softmax,
    Linear,
}

impl Activation {
    pub const ALL: [Activation; 5] = [
        Activation::Sigmoid,
        Activation::ReLU,
        Activation::Tanh,
        Activation::Softmax,
        Activation::Linear,
    ];

    /// Element-wise activation.
    pub fn activate(&self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            Activation::ReLU => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
            Activation::Tanh => x.tanh(),
            Activation::Softmax | Activation::Linear => x,
        }
    }

    /// Slope expressed in terms of the already-activated value `y = activate(x)`.
    pub fn derivative_from_output(&self, y: f64) -> f64 {
        match self {
            Activation::Sigmoid => y * (1.0 - y),
            Activation::ReLU => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Tanh => 1.0 - y * y,
            Activation::Softmax | Activation::Linear => 1.0,
        }
    }

    /// Slope expressed in terms of the pre-activation value `x`.
    pub fn derivative_from_input(&self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid | Activation::Tanh => {
                self.derivative_from_output(self.activate(x))
            }
            Activation::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Softmax | Activation::Linear => 1.0,
        }
    }

    /// Slope used by the backward pass, given both cached values of a neuron.
    ///
    /// Sigmoid and Tanh read the activated value `y` (no recomputation),
    /// ReLU and Linear read the pre-activation `z`.
    pub fn slope(&self, z: f64, y: f64) -> f64 {
        match self {
            Activation::Sigmoid | Activation::Tanh => self.derivative_from_output(y),
            Activation::ReLU | Activation::Softmax | Activation::Linear => {
                self.derivative_from_input(z)
            }
        }
    }

    /// Strategy applied element-wise to hidden layers.
    ///
    /// Softmax only makes sense over a whole vector, so a network configured
    /// with it keeps sigmoid hidden layers.
    pub fn hidden_strategy(self) -> Activation {
        match self {
            Activation::Softmax => Activation::Sigmoid,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Activation::Sigmoid => "SIGMOID",
            Activation::ReLU => "RELU",
            Activation::Tanh => "TANH",
            Activation::Softmax => "SOFTMAX",
            Activation::Linear => "LINEAR",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown activation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseActivationError(pub String);

impl fmt::Display for ParseActivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown activation `{}`", self.0)
    }
}

impl std::error::Error for ParseActivationError {}

impl FromStr for Activation {
    type Err = ParseActivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activation::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseActivationError(s.to_string()))
    }
}

/// Numerically stable softmax: subtracts the maximum before exponentiating.
pub fn softmax(x: &[f64]) -> Vec<f64> {
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = x.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_reference_values() {
        assert!((Activation::Sigmoid.activate(0.0) - 0.5).abs() < TOL);
        assert_eq!(Activation::ReLU.activate(-5.0), 0.0);
        assert_eq!(Activation::ReLU.activate(5.0), 5.0);
        assert!(Activation::Tanh.activate(0.0).abs() < TOL);
        assert_eq!(Activation::Linear.activate(-3.25), -3.25);
    }

    #[test]
    fn test_derivative_conventions_agree() {
        for act in [Activation::Sigmoid, Activation::Tanh, Activation::ReLU, Activation::Linear] {
            for x in [-2.0, -0.3, 0.4, 1.7] {
                let y = act.activate(x);
                let from_in = act.derivative_from_input(x);
                let from_out = act.derivative_from_output(y);
                assert!((from_in - from_out).abs() < 1e-12, "{act} at {x}");
                assert!((act.slope(x, y) - from_in).abs() < 1e-12, "{act} at {x}");
            }
        }
    }

    #[test]
    fn test_sigmoid_derivative_matches_finite_difference() {
        let h = 1e-6;
        for x in [-1.5, 0.0, 2.0] {
            let numeric = (Activation::Sigmoid.activate(x + h) - Activation::Sigmoid.activate(x - h)) / (2.0 * h);
            assert!((numeric - Activation::Sigmoid.derivative_from_input(x)).abs() < 1e-8);
        }
    }

    #[test]
    fn test_softmax_hidden_strategy_falls_back_to_sigmoid() {
        assert_eq!(Activation::Softmax.hidden_strategy(), Activation::Sigmoid);
        assert_eq!(Activation::ReLU.hidden_strategy(), Activation::ReLU);
    }

    #[test]
    fn test_parse_and_display() {
        for act in Activation::ALL {
            assert_eq!(act.to_string().parse::<Activation>(), Ok(act));
        }
        assert_eq!("relu".parse::<Activation>(), Ok(Activation::ReLU));
        assert!("swish".parse::<Activation>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Activation::ReLU).unwrap();
        assert_eq!(json, "\"relu\"");
        let back: Activation = serde_json::from_str("\"tanh\"").unwrap();
        assert_eq!(back, Activation::Tanh);
    }

    #[test]
    fn test_softmax_sums_to_one_and_survives_large_inputs() {
        let p = softmax(&[1000.0, 1001.0, 999.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[1] > p[0] && p[0] > p[2]);
        assert!(p.iter().all(|v| v.is_finite()));
    }
}

use serde::{Deserialize, Serialize};

/// The specification for the round robin sparse update protocol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FederationSpec {
    /// Fraction of coordinates each client shares per round.
    pub theta: f64,
    /// Maximum amount of client rounds.
    pub max_evals: usize,
    /// Infinity norm of the gradient under which the protocol stops.
    pub opt_tol: f64,
}

impl Default for FederationSpec {
    fn default() -> Self {
        Self {
            theta: 1.,
            max_evals: 100,
            opt_tol: 1e-2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::machine_learning::{LocalModelSpec, ObjectiveSpec, RegularizationSpec};
    use super::*;

    #[test]
    fn local_model_spec_from_json_fills_defaults() {
        let json = r#"{
            "objective": "logistic",
            "regularization": { "l2": { "lambda": 1.0 } },
            "seed": 7
        }"#;

        let spec: LocalModelSpec = serde_json::from_str(json).unwrap();

        assert_eq!(spec.objective, ObjectiveSpec::Logistic);
        assert_eq!(spec.regularization, RegularizationSpec::L2 { lambda: 1.0 });
        assert_eq!(spec.minimizer.max_evals, 100);
        assert_eq!(spec.seed, Some(7));
        assert!(spec.sensitivity.is_none());
    }

    #[test]
    fn federation_spec_round_trips_through_json() {
        let spec = FederationSpec {
            theta: 0.25,
            max_evals: 400,
            opt_tol: 1e-3,
        };

        let json = serde_json::to_string(&spec).unwrap();
        let back: FederationSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn unit_regularization_variant_is_a_plain_string() {
        let reg: RegularizationSpec = serde_json::from_str(r#""none""#).unwrap();
        assert_eq!(reg, RegularizationSpec::None);
        assert_eq!(reg.lambda(), 0.);
    }
}

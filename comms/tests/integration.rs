use comms::{
    Deserialize, ModelBlob, ModelState, Serialize,
    specs::machine_learning::{LocalModelSpec, ObjectiveSpec, RegularizationSpec},
};

fn state(params: Vec<f64>) -> ModelState {
    let mut spec = LocalModelSpec::new(ObjectiveSpec::LeastSquares, RegularizationSpec::L1 { lambda: 0.3 });
    spec.seed = Some(42);
    spec.sensitivity = Some(2.5);

    ModelState {
        spec,
        step: 0.5,
        params,
    }
}

#[test]
fn serialize_deserialize() {
    let state = state(vec![1., -0., f64::EPSILON, 1e300]);
    let mut buf = Vec::new();
    state.serialize(&mut buf).unwrap();

    let back = ModelState::deserialize(&buf).unwrap();
    assert_eq!(back, state);
    assert!(back.params[1].is_sign_negative());
}

#[test]
fn blob_keeps_appended_buffers_apart() {
    let first = state(vec![1., 2.]);
    let mut buf = vec![0xAB];
    first.serialize(&mut buf).unwrap();

    assert_eq!(buf[0], 0xAB);
    assert_eq!(ModelState::deserialize(&buf[1..]).unwrap(), first);
}

#[test]
fn empty_parameters_are_allowed() {
    let blob = ModelBlob::encode(&state(Vec::new())).unwrap();
    assert!(blob.decode().unwrap().params.is_empty());
}

#[test]
fn garbage_header_is_rejected() {
    let mut bytes = ModelBlob::encode(&state(vec![1.])).unwrap().into_bytes();
    bytes[8] = b'}';

    assert!(ModelBlob::from_bytes(bytes).decode().is_err());
}

//! Minimal ONNX encoder for synthetic classifiers.
//!
//! Only the protobuf messages needed for a linear softmax head are declared.
//! The graph is `input (batch, len, 1) -> Flatten -> Gemm -> Softmax`, which
//! has the same tensor contract as the exported training model.

use prost::Message;

use crate::error::ArtifactError;

const IR_VERSION: i64 = 7;
const OPSET_VERSION: i64 = 13;

const ELEM_FLOAT: i32 = 1;
const ATTR_INT: i32 = 2;

pub const INPUT_NAME: &str = "input";
pub const OUTPUT_NAME: &str = "probabilities";

#[derive(Clone, PartialEq, Message)]
struct ModelProto {
    #[prost(int64, tag = "1")]
    ir_version: i64,
    #[prost(string, tag = "2")]
    producer_name: String,
    #[prost(message, optional, tag = "7")]
    graph: Option<GraphProto>,
    #[prost(message, repeated, tag = "8")]
    opset_import: Vec<OperatorSetIdProto>,
}

#[derive(Clone, PartialEq, Message)]
struct OperatorSetIdProto {
    #[prost(string, tag = "1")]
    domain: String,
    #[prost(int64, tag = "2")]
    version: i64,
}

#[derive(Clone, PartialEq, Message)]
struct GraphProto {
    #[prost(message, repeated, tag = "1")]
    node: Vec<NodeProto>,
    #[prost(string, tag = "2")]
    name: String,
    #[prost(message, repeated, tag = "5")]
    initializer: Vec<TensorProto>,
    #[prost(message, repeated, tag = "11")]
    input: Vec<ValueInfoProto>,
    #[prost(message, repeated, tag = "12")]
    output: Vec<ValueInfoProto>,
}

#[derive(Clone, PartialEq, Message)]
struct NodeProto {
    #[prost(string, repeated, tag = "1")]
    input: Vec<String>,
    #[prost(string, repeated, tag = "2")]
    output: Vec<String>,
    #[prost(string, tag = "3")]
    name: String,
    #[prost(string, tag = "4")]
    op_type: String,
    #[prost(message, repeated, tag = "5")]
    attribute: Vec<AttributeProto>,
}

#[derive(Clone, PartialEq, Message)]
struct AttributeProto {
    #[prost(string, tag = "1")]
    name: String,
    #[prost(int64, optional, tag = "3")]
    i: Option<i64>,
    #[prost(int32, tag = "20")]
    attr_type: i32,
}

#[derive(Clone, PartialEq, Message)]
struct TensorProto {
    #[prost(int64, repeated, tag = "1")]
    dims: Vec<i64>,
    #[prost(int32, tag = "2")]
    data_type: i32,
    #[prost(float, repeated, tag = "4")]
    float_data: Vec<f32>,
    #[prost(string, tag = "8")]
    name: String,
}

#[derive(Clone, PartialEq, Message)]
struct ValueInfoProto {
    #[prost(string, tag = "1")]
    name: String,
    #[prost(message, optional, tag = "2")]
    value_type: Option<TypeProto>,
}

#[derive(Clone, PartialEq, Message)]
struct TypeProto {
    #[prost(message, optional, tag = "1")]
    tensor_type: Option<TensorTypeProto>,
}

#[derive(Clone, PartialEq, Message)]
struct TensorTypeProto {
    #[prost(int32, tag = "1")]
    elem_type: i32,
    #[prost(message, optional, tag = "2")]
    shape: Option<TensorShapeProto>,
}

#[derive(Clone, PartialEq, Message)]
struct TensorShapeProto {
    #[prost(message, repeated, tag = "1")]
    dim: Vec<Dimension>,
}

#[derive(Clone, PartialEq, Message)]
struct Dimension {
    #[prost(int64, optional, tag = "1")]
    dim_value: Option<i64>,
    #[prost(string, optional, tag = "2")]
    dim_param: Option<String>,
}

/// Linear classifier `softmax(x · weights + bias)` as ONNX bytes
///
/// `weights` is row-major `(input_len, classes)`. With `softmax = false` the
/// graph returns the raw logits, which lets tests feed the runtime a model
/// whose output is not a distribution.
pub fn linear_classifier(
    input_len: usize,
    weights: &[f32],
    bias: &[f32],
    softmax: bool,
) -> Result<Vec<u8>, ArtifactError> {
    let classes = bias.len();
    if weights.len() != input_len * classes {
        return Err(ArtifactError::InvalidModel {
            reason: format!(
                "{} weights for {} inputs x {} classes",
                weights.len(),
                input_len,
                classes
            ),
        });
    }

    let mut node = vec![
        NodeProto {
            input: vec![INPUT_NAME.to_string()],
            output: vec!["flat".to_string()],
            name: "flatten".to_string(),
            op_type: "Flatten".to_string(),
            attribute: vec![int_attribute("axis", 1)],
        },
        NodeProto {
            input: vec![
                "flat".to_string(),
                "dense/kernel".to_string(),
                "dense/bias".to_string(),
            ],
            output: vec![if softmax { "logits" } else { OUTPUT_NAME }.to_string()],
            name: "dense".to_string(),
            op_type: "Gemm".to_string(),
            attribute: Vec::new(),
        },
    ];
    if softmax {
        node.push(NodeProto {
            input: vec!["logits".to_string()],
            output: vec![OUTPUT_NAME.to_string()],
            name: "softmax".to_string(),
            op_type: "Softmax".to_string(),
            attribute: vec![int_attribute("axis", -1)],
        });
    }

    let model = ModelProto {
        ir_version: IR_VERSION,
        producer_name: "emotion_pipeline.testing".to_string(),
        graph: Some(GraphProto {
            node,
            name: "linear_classifier".to_string(),
            initializer: vec![
                float_tensor("dense/kernel", &[input_len as i64, classes as i64], weights),
                float_tensor("dense/bias", &[classes as i64], bias),
            ],
            input: vec![value_info(
                INPUT_NAME,
                &[batch_dim(), fixed_dim(input_len), fixed_dim(1)],
            )],
            output: vec![value_info(OUTPUT_NAME, &[batch_dim(), fixed_dim(classes)])],
        }),
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: OPSET_VERSION,
        }],
    };
    Ok(model.encode_to_vec())
}

fn int_attribute(name: &str, value: i64) -> AttributeProto {
    AttributeProto {
        name: name.to_string(),
        i: Some(value),
        attr_type: ATTR_INT,
    }
}

fn float_tensor(name: &str, dims: &[i64], data: &[f32]) -> TensorProto {
    TensorProto {
        dims: dims.to_vec(),
        data_type: ELEM_FLOAT,
        float_data: data.to_vec(),
        name: name.to_string(),
    }
}

fn value_info(name: &str, dims: &[Dimension]) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        value_type: Some(TypeProto {
            tensor_type: Some(TensorTypeProto {
                elem_type: ELEM_FLOAT,
                shape: Some(TensorShapeProto { dim: dims.to_vec() }),
            }),
        }),
    }
}

fn batch_dim() -> Dimension {
    Dimension {
        dim_value: None,
        dim_param: Some("batch".to_string()),
    }
}

fn fixed_dim(size: usize) -> Dimension {
    Dimension {
        dim_value: Some(size as i64),
        dim_param: None,
    }
}

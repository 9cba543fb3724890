//! Generated protobuf types for the wire envelopes defined in
//! `proto/angzarr/angzarr.proto`.

include!(concat!(env!("OUT_DIR"), "/angzarr.rs"));

//! The canonical stitch-effect table: for each recognized op prefix, its
//! `OpKind`, net stitch-count effect per instance, and stitches consumed per
//! instance. Read-only, built once.

use stitch_model::OpKind;
use std::collections::HashMap;
use std::sync::LazyLock;

pub static EFFECT_TABLE: LazyLock<HashMap<&'static str, (OpKind, i64, i64)>> = LazyLock::new(|| {
    use OpKind::*;
    HashMap::from([
        ("k", (Knit, 0, 1)),
        ("p", (Purl, 0, 1)),
        ("sl", (Slip, 0, 1)),
        ("sl1", (Slip, 0, 1)),
        ("wyif", (Slip, 0, 1)),
        ("wyib", (Slip, 0, 1)),
        ("sm", (SlipMarker, 0, 0)),
        ("pm", (PlaceMarker, 0, 0)),
        ("k2tog", (K2Tog, -1, 2)),
        ("ssk", (Ssk, -1, 2)),
        ("p2tog", (P2Tog, -1, 2)),
        ("ssp", (Ssp, -1, 2)),
        ("sk2p", (Sk2p, -2, 3)),
        ("s2kp", (S2kp, -2, 3)),
        ("k3tog", (K3Tog, -2, 3)),
        ("p3tog", (P3Tog, -2, 3)),
        ("cdd", (Sk2p, -2, 3)),
        ("yo", (Yo, 1, 0)),
        ("m1", (M1, 1, 0)),
        ("m1l", (M1l, 1, 0)),
        ("m1r", (M1r, 1, 0)),
        ("m1p", (M1, 1, 0)),
        ("kfb", (Kfb, 1, 1)),
        ("pfb", (Pfb, 1, 1)),
        ("bo", (BindOff, -1, 1)),
        ("co", (CastOn, 1, 0)),
    ])
});

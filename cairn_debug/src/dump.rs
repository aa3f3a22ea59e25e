// Copyright 2026 the Cairn Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entry chain dumps.
//!
//! Both renderings list the entry's ancestors root first, one operation per
//! line or array element, ending with the entry itself.

use std::fmt::Write as _;

use cairn_core::entry::{Entry, Op};
use cairn_core::transform::Matrix;
use serde_json::{Value, json};

/// Formats `entry` and its ancestors as text, root first.
///
/// ```text
/// 0: load_identity
/// 1: translate x=1 y=2 z=0
/// 2: save (cached)
/// ```
#[must_use]
pub fn format_chain(entry: &Entry) -> String {
    let mut out = String::new();
    for (i, e) in root_first(entry).into_iter().enumerate() {
        let _ = write!(out, "{i}: {}", e.kind().name());
        match e.op() {
            Op::LoadIdentity => {}
            Op::Translate { x, y, z } | Op::Scale { x, y, z } => {
                let _ = write!(out, " x={x} y={y} z={z}");
            }
            Op::Rotate { angle, x, y, z } => {
                let _ = write!(out, " angle={angle} axis=({x}, {y}, {z})");
            }
            Op::RotateQuaternion(q) => {
                let _ = write!(out, " i={} j={} k={} r={}", q.i, q.j, q.k, q.r);
            }
            Op::RotateEuler(e) => {
                let _ = write!(
                    out,
                    " heading={} pitch={} roll={}",
                    e.heading, e.pitch, e.roll
                );
            }
            Op::Multiply(m) | Op::Load(m) => {
                let _ = write!(out, " {:?}", m.to_array());
            }
            Op::Save(cache) => {
                out.push_str(if cache.is_valid() {
                    " (cached)"
                } else {
                    " (empty)"
                });
            }
        }
        out.push('\n');
    }
    out
}

/// Exports `entry` and its ancestors as a JSON array, root first.
///
/// Each element is an object with an `"op"` name and the operation's payload
/// fields. Matrices are arrays of 16 numbers in `euclid` row-major order.
#[must_use]
pub fn chain_to_json(entry: &Entry) -> Value {
    let ops = root_first(entry)
        .into_iter()
        .map(|e| {
            let name = e.kind().name();
            match e.op() {
                Op::LoadIdentity => json!({ "op": name }),
                Op::Translate { x, y, z } | Op::Scale { x, y, z } => {
                    json!({ "op": name, "x": x, "y": y, "z": z })
                }
                Op::Rotate { angle, x, y, z } => {
                    json!({ "op": name, "angle": angle, "x": x, "y": y, "z": z })
                }
                Op::RotateQuaternion(q) => {
                    json!({ "op": name, "i": q.i, "j": q.j, "k": q.k, "r": q.r })
                }
                Op::RotateEuler(e) => json!({
                    "op": name,
                    "heading": e.heading,
                    "pitch": e.pitch,
                    "roll": e.roll,
                }),
                Op::Multiply(m) | Op::Load(m) => json!({ "op": name, "matrix": matrix_json(m) }),
                Op::Save(cache) => json!({
                    "op": name,
                    "cache": cache.get().map(matrix_json),
                }),
            }
        })
        .collect();
    Value::Array(ops)
}

fn root_first(entry: &Entry) -> Vec<&Entry> {
    let mut chain: Vec<_> = entry.ancestors().collect();
    chain.reverse();
    chain
}

fn matrix_json(m: &Matrix) -> Value {
    json!(m.to_array())
}

#[cfg(test)]
mod tests {
    use cairn_core::Context;
    use cairn_core::transform::{Euler, Quaternion};

    use super::*;

    #[test]
    fn text_is_root_first() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.translate(1.0, 2.0, 0.0);
        stack.push();
        stack.rotate(90.0, 0.0, 0.0, 1.0);
        let _ = stack.get();

        let text = format_chain(stack.entry_ref());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "0: load_identity",
                "1: translate x=1 y=2 z=0",
                "2: save (cached)",
                "3: rotate angle=90 axis=(0, 0, 1)",
            ]
        );
    }

    #[test]
    fn text_of_root_only() {
        let ctx = Context::new();
        assert_eq!(format_chain(&ctx.identity()), "0: load_identity\n");
    }

    #[test]
    fn text_covers_every_payload() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.push();
        stack.rotate_quaternion(&Quaternion::identity());
        stack.rotate_euler(&Euler::new(10.0, 20.0, 30.0));
        stack.scale(2.0, 2.0, 2.0);
        stack.multiply(&Matrix::identity());

        let text = format_chain(stack.entry_ref());
        assert!(text.contains("1: save (empty)"), "got: {text}");
        assert!(text.contains("2: rotate_quaternion i=0 j=0 k=0 r=1"), "got: {text}");
        assert!(text.contains("3: rotate_euler heading=10 pitch=20 roll=30"), "got: {text}");
        assert!(text.contains("4: scale x=2 y=2 z=2"), "got: {text}");
        assert!(text.contains("5: multiply [1.0, 0.0"), "got: {text}");
    }

    #[test]
    fn json_shape() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.push();
        stack.set(&Matrix::translation(3.0, 0.0, 0.0));
        stack.translate(0.0, 1.0, 0.0);

        let value = chain_to_json(stack.entry_ref());
        let ops = value.as_array().unwrap();
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0], json!({ "op": "load_identity" }));
        assert_eq!(ops[1], json!({ "op": "save", "cache": null }));
        assert_eq!(ops[2]["op"], "load");
        assert_eq!(ops[2]["matrix"].as_array().unwrap().len(), 16);
        assert_eq!(ops[2]["matrix"][12], 3.0);
        assert_eq!(
            ops[3],
            json!({ "op": "translate", "x": 0.0, "y": 1.0, "z": 0.0 })
        );
    }

    #[test]
    fn json_includes_filled_cache() {
        let ctx = Context::new();
        let mut stack = ctx.new_stack();
        stack.scale(2.0, 2.0, 2.0);
        stack.push();
        let _ = stack.get();

        let value = chain_to_json(stack.entry_ref());
        let cache = &value[2]["cache"];
        assert_eq!(cache[0], 2.0);
        assert_eq!(cache[15], 1.0);
    }
}

use regex::Regex;

use crate::cipher::ops::DecipherOp;
use crate::common::errors::ResolveError;

fn re(pattern: &str) -> Result<Regex, ResolveError> {
    Regex::new(pattern).map_err(|e| ResolveError::TokenExtraction(e.to_string()))
}

/// Extracts the decipher operation sequence from player script text.
///
/// The script defines a helper object of three string transformations and a
/// decipher function that calls them in sequence on the split signature.
/// Both are located by pattern search; when the platform changes its script
/// format this fails loudly with `TokenExtraction` so the patterns can be
/// updated. An empty or partially recognized sequence is never returned.
pub fn extract_operations(script: &str) -> Result<Vec<DecipherOp>, ResolveError> {
    let body_re = re(r#"(?s)a=a\.split\(""\);(.*?);return a\.join\(""\)"#)?;
    let body = body_re
        .captures(script)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            ResolveError::TokenExtraction("could not locate decipher function body".to_string())
        })?;

    let call_re = re(r#"^([A-Za-z0-9_$]+)(?:\.([A-Za-z0-9_$]+)|\["([^"]+)"\])\(a,(\d+)\)$"#)?;
    let mut calls: Vec<(&str, &str, usize)> = Vec::new();
    for call in body.split(';') {
        let caps = call_re.captures(call.trim()).ok_or_else(|| {
            ResolveError::TokenExtraction(format!("unrecognized call in decipher body: {call}"))
        })?;
        let object = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let helper = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let arg = caps
            .get(4)
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .unwrap_or(0);
        calls.push((object, helper, arg));
    }
    if calls.is_empty() {
        return Err(ResolveError::TokenExtraction(
            "decipher body contains no transformation calls".to_string(),
        ));
    }

    let object_name = calls[0].0;
    let helpers = parse_helper_object(script, object_name)?;

    let mut ops = Vec::with_capacity(calls.len());
    for (_, helper, arg) in calls {
        let kind = helpers
            .iter()
            .find(|(name, _)| *name == helper)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| {
                ResolveError::TokenExtraction(format!("call to unknown helper: {helper}"))
            })?;
        ops.push(match kind {
            HelperKind::Reverse => DecipherOp::Reverse,
            HelperKind::Swap => DecipherOp::Swap(arg),
            HelperKind::Splice => DecipherOp::Splice(arg),
        });
    }
    Ok(ops)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HelperKind {
    Reverse,
    Swap,
    Splice,
}

/// Finds `var <name>={...};` and classifies each helper function by the
/// transformation idiom in its body.
fn parse_helper_object(script: &str, name: &str) -> Result<Vec<(String, HelperKind)>, ResolveError> {
    let object_re = re(&format!(
        r#"(?s)var {}=\{{(.*?)\}};"#,
        regex::escape(name)
    ))?;
    let entries = object_re
        .captures(script)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            ResolveError::TokenExtraction(format!("helper object `{name}` not found"))
        })?;

    let mut helpers = Vec::new();
    for entry in entries.split("},") {
        let Some((helper_name, function_body)) = entry.split_once(':') else {
            continue;
        };
        let kind = if function_body.contains(".reverse(") {
            HelperKind::Reverse
        } else if function_body.contains(".splice(") || function_body.contains(".slice(") {
            HelperKind::Splice
        } else if function_body.contains("%a.length") || function_body.contains("var c=a[0]") {
            HelperKind::Swap
        } else {
            return Err(ResolveError::TokenExtraction(format!(
                "unrecognized transformation in helper `{}`",
                helper_name.trim()
            )));
        };
        helpers.push((helper_name.trim().to_string(), kind));
    }
    if helpers.is_empty() {
        return Err(ResolveError::TokenExtraction(format!(
            "helper object `{name}` has no recognizable entries"
        )));
    }
    Ok(helpers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::ops::apply_operations;

    const SCRIPT: &str = concat!(
        r#"var Xx={r9:function(a){a.reverse()},"#,
        r#"s0:function(a,b){a.splice(0,b)},"#,
        r#"w4:function(a,b){var c=a[0];a[0]=a[b%a.length];a[b%a.length]=c}};"#,
        r#"var dec=function(a){a=a.split("");Xx.w4(a,2);Xx.r9(a,66);Xx.s0(a,3);return a.join("")};"#,
    );

    #[test]
    fn extracts_ordered_operation_sequence() {
        let ops = extract_operations(SCRIPT).unwrap();
        assert_eq!(
            ops,
            vec![DecipherOp::Swap(2), DecipherOp::Reverse, DecipherOp::Splice(3)]
        );
    }

    #[test]
    fn extracted_sequence_replays_correctly() {
        let ops = extract_operations(SCRIPT).unwrap();
        // swap(2): "0123456789" -> "2103456789"
        // reverse: -> "9876543012"
        // splice(3): -> "6543012"
        assert_eq!(apply_operations(&ops, "0123456789"), "6543012");
    }

    #[test]
    fn bracket_notation_calls_are_recognized() {
        let script = concat!(
            r#"var $z={aB:function(a){a.reverse()}};"#,
            r#"var dec=function(a){a=a.split("");$z["aB"](a,0);return a.join("")};"#,
        );
        let ops = extract_operations(script).unwrap();
        assert_eq!(ops, vec![DecipherOp::Reverse]);
    }

    #[test]
    fn slice_helper_counts_as_splice() {
        let script = concat!(
            r#"var Qq={cut:function(a,b){return a.slice(b)}};"#,
            r#"var dec=function(a){a=a.split("");Qq.cut(a,4);return a.join("")};"#,
        );
        let ops = extract_operations(script).unwrap();
        assert_eq!(ops, vec![DecipherOp::Splice(4)]);
    }

    #[test]
    fn missing_function_body_fails_loudly() {
        let err = extract_operations("var noop=function(a){return a};").unwrap_err();
        assert!(matches!(err, ResolveError::TokenExtraction(_)));
    }

    #[test]
    fn unknown_helper_idiom_fails_loudly() {
        let script = concat!(
            r#"var Xx={zz:function(a,b){a.push(b)}};"#,
            r#"var dec=function(a){a=a.split("");Xx.zz(a,1);return a.join("")};"#,
        );
        let err = extract_operations(script).unwrap_err();
        assert!(matches!(err, ResolveError::TokenExtraction(_)));
    }

    #[test]
    fn missing_helper_object_fails_loudly() {
        let script = r#"var dec=function(a){a=a.split("");Yy.r9(a,2);return a.join("")};"#;
        let err = extract_operations(script).unwrap_err();
        assert!(matches!(err, ResolveError::TokenExtraction(_)));
    }
}

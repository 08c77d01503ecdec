use std::sync::OnceLock;

use regex::Regex;

use crate::features::{EmitContext, FeatureRegistry};

const MAX_CALL_ARGS: usize = 3;

/// Expands `$feature(a,b,c)` calls in one left-to-right pass.
///
/// Replacement text is never rescanned, and the argument list ends at the
/// first `)` after the opening paren, so arguments cannot contain parens.
pub fn expand_feature_calls(
    text: &str,
    registry: &FeatureRegistry,
    ctx: &mut EmitContext,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;

    while let Some(found) = text[cursor..].find('$') {
        let dollar = cursor + found;
        match expand_call_at(text, dollar, registry, ctx) {
            Some((replacement, end)) => {
                out.push_str(&text[cursor..dollar]);
                out.push_str(&replacement);
                cursor = end;
            }
            None => {
                out.push_str(&text[cursor..=dollar]);
                cursor = dollar + 1;
            }
        }
    }

    out.push_str(&text[cursor..]);
    out
}

// Returns the replacement and the byte offset just past the closing paren.
fn expand_call_at(
    text: &str,
    dollar: usize,
    registry: &FeatureRegistry,
    ctx: &mut EmitContext,
) -> Option<(String, usize)> {
    let after = dollar + 1;
    let open = after + text[after..].find('(')?;
    let close = open + text[open..].find(')')?;

    let name = &text[after..open];
    if !identifier_regex().is_match(name) || !registry.has(name) {
        return None;
    }
    let feature = registry.get(name).ok()?;

    let args = text[open + 1..close]
        .split(',')
        .filter(|token| !token.is_empty())
        .take(MAX_CALL_ARGS)
        .collect::<Vec<_>>();
    let replacement = feature.compile(
        ctx,
        args.first().copied(),
        args.get(1).copied(),
        args.get(2).copied(),
    );
    Some((replacement, close + 1))
}

fn identifier_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex"))
}

#[cfg(test)]
mod expander_tests {
    use super::*;

    fn registry() -> FeatureRegistry {
        let mut registry = FeatureRegistry::default();
        registry
            .register("item", "$.haveItem($x, $y)", Some("Packages.client".to_string()))
            .expect("item");
        registry.register("nested", "$item(1,2)", None).expect("nested");
        registry
            .register_switch("switch_level", "$x", None, "$.getLevel()")
            .expect("switch");
        registry
    }

    #[test]
    fn expands_registered_calls_and_records_dependencies() {
        let registry = registry();
        let mut ctx = EmitContext::new("cm");
        let out = expand_feature_calls("if ($item(4000000,10)) ok();", &registry, &mut ctx);
        assert_eq!(out, "if (cm.haveItem(4000000, 10)) ok();");
        assert_eq!(ctx.dependencies(), vec!["Packages.client".to_string()]);
    }

    #[test]
    fn drops_empty_argument_tokens() {
        let registry = registry();
        let mut ctx = EmitContext::new("cm");
        assert_eq!(
            expand_feature_calls("$item(,5,)", &registry, &mut ctx),
            "cm.haveItem(5, )"
        );
    }

    #[test]
    fn switch_features_expand_to_comparisons() {
        let registry = registry();
        let mut ctx = EmitContext::new("cm");
        assert_eq!(
            expand_feature_calls("x = $switch_level(30);", &registry, &mut ctx),
            "x = cm.getLevel() == 30;"
        );
    }

    #[test]
    fn inserted_text_is_not_rescanned() {
        let registry = registry();
        let mut ctx = EmitContext::new("cm");
        assert_eq!(
            expand_feature_calls("a $nested() b", &registry, &mut ctx),
            "a $item(1,2) b"
        );
        assert!(ctx.dependencies().is_empty());
    }

    #[test]
    fn later_calls_in_the_original_text_still_expand() {
        let registry = registry();
        let mut ctx = EmitContext::new("cm");
        assert_eq!(
            expand_feature_calls("$nested() + $item(3,4)", &registry, &mut ctx),
            "$item(1,2) + cm.haveItem(3, 4)"
        );
    }

    #[test]
    fn leaves_text_without_known_calls_untouched() {
        let registry = registry();
        let mut ctx = EmitContext::new("cm");
        for text in [
            "no dollars here",
            "price $5 (cheap)",
            "$unknown(1)",
            "trailing $",
            "$item without parens",
            "$(x)",
        ] {
            let once = expand_feature_calls(text, &registry, &mut ctx);
            assert_eq!(once, text);
            assert_eq!(expand_feature_calls(&once, &registry, &mut ctx), text);
        }
    }

    #[test]
    fn first_close_paren_ends_the_argument_list() {
        let registry = registry();
        let mut ctx = EmitContext::new("cm");
        assert_eq!(
            expand_feature_calls("$item(f(1),2)", &registry, &mut ctx),
            "cm.haveItem(f(1, ),2)"
        );
    }
}

//! Type reference conversion

use super::ConversionContext;
use crate::ast::{SourceRange, TypeRef};
use crate::casing;
use crate::symbols::{BuiltinType, ResolvedType};

/// Written type reference → target spelling (keywords, declared casing)
pub fn type_ref(ctx: &mut ConversionContext<'_>, tref: &TypeRef) -> TypeRef {
    let name = match casing::normalize_type_name(ctx.model, &tref.name, ctx.scope(), ctx.target) {
        Some(name) => name,
        None => {
            ctx.warn_unresolved(
                tref.range,
                format!("type '{}' could not be resolved; name kept as written", tref.name),
            );
            tref.name.clone()
        }
    };
    let type_args = tref.type_args.iter().map(|a| type_ref(ctx, a)).collect();
    TypeRef {
        id: ctx.builder.next_id(),
        range: tref.range,
        name,
        type_args,
        array_ranks: tref.array_ranks.clone(),
    }
}

pub fn opt_type_ref(ctx: &mut ConversionContext<'_>, tref: Option<&TypeRef>) -> Option<TypeRef> {
    tref.map(|t| type_ref(ctx, t))
}

/// Type reference spelling a resolved type; `None` for types with no written form
pub fn from_resolved(ctx: &ConversionContext<'_>, ty: &ResolvedType, range: SourceRange) -> Option<TypeRef> {
    let b = ctx.at(range);
    match ty {
        ResolvedType::Builtin(builtin) => Some(b.ty(&casing::builtin_spelling(*builtin, ctx.target))),
        ResolvedType::Named(id) => {
            let simple = ctx.model.name_of(*id);
            // 単純名で同じ型に届かなければ修飾名を書く
            let reachable = ctx
                .model
                .lookup(ctx.scope(), simple)
                .first()
                .is_some_and(|hit| hit == id);
            let name = if reachable {
                simple.to_string()
            } else {
                ctx.model.qualified_name(*id)
            };
            Some(b.ty(&name))
        }
        ResolvedType::Array { element, rank } => {
            from_resolved(ctx, element, range).map(|elem| elem.with_array_rank(*rank))
        }
        ResolvedType::Delegate(_) | ResolvedType::Null | ResolvedType::Unknown => None,
    }
}

/// `object` / `Object`
pub fn object_type(ctx: &ConversionContext<'_>, range: SourceRange) -> TypeRef {
    ctx.at(range)
        .ty(&casing::builtin_spelling(BuiltinType::Object, ctx.target))
}

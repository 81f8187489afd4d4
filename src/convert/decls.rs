//! Declaration rules

use super::{stmts, types, ConversionContext};
use crate::ast::{Access, Decl, DeclKind, Language, Modifiers, Param, TypeDeclKind};
use crate::symbols::TypeKind;

/// Declared spelling of the name a declaration introduces
pub fn declared_name(ctx: &ConversionContext<'_>, decl: &Decl, written: &str) -> String {
    match ctx.model.symbol_of_node(decl.id) {
        Some(symbol) => ctx.declared_name(symbol),
        None => written.to_string(),
    }
}

/// Member modifiers with the source language's default access written out.
///
/// C# のメンバーは既定で private、VB のメソッド・プロパティ・イベントは
/// 既定で Public。インターフェイスのメンバーにはアクセス修飾子を付けない。
pub fn member_modifiers(ctx: &ConversionContext<'_>, m: &Modifiers, method_like: bool) -> Modifiers {
    let mut out = m.clone();
    let container = ctx.current_type_kind();
    if out.access.is_none() && container != Some(TypeKind::Interface) {
        out.access = Some(match ctx.source {
            Language::CSharp => Access::Private,
            Language::VBNet if method_like => Access::Public,
            Language::VBNet => Access::Private,
        });
    }
    if container == Some(TypeKind::Module) {
        // VB の Module のメンバーは暗黙に Shared、C# の static class は明示が必要
        out.is_static = ctx.target == Language::CSharp;
    }
    out
}

pub fn params(ctx: &mut ConversionContext<'_>, params: &[Param]) -> Vec<Param> {
    params
        .iter()
        .map(|p| {
            let ty = types::type_ref(ctx, &p.ty);
            let name = match ctx.model.symbol_of_node(p.id) {
                Some(symbol) => ctx.declared_name(symbol),
                None => p.name.clone(),
            };
            Param {
                id: ctx.builder.next_id(),
                range: p.range,
                name,
                ty,
                by_ref: p.by_ref,
            }
        })
        .collect()
}

pub fn namespace(decl: &Decl, ctx: &mut ConversionContext<'_>) -> Vec<Decl> {
    let DeclKind::Namespace { name, members } = &decl.kind else {
        return Vec::new();
    };
    let members = ctx.in_scope(decl.id, |ctx| ctx.convert_decls(members));
    vec![ctx.at(decl.range).decl(DeclKind::Namespace {
        name: name.clone(),
        members,
    })]
}

pub fn type_decl(decl: &Decl, ctx: &mut ConversionContext<'_>) -> Vec<Decl> {
    let DeclKind::Type {
        name,
        kind,
        modifiers,
        bases,
        members,
    } = &decl.kind
    else {
        return Vec::new();
    };
    let name = declared_name(ctx, decl, name);
    let mut modifiers = modifiers.clone();
    // VB Module ⇄ C# static class
    let (kind, member_context) = match (ctx.target, kind) {
        (Language::VBNet, TypeDeclKind::Class) if modifiers.is_static => {
            modifiers.is_static = false;
            (TypeDeclKind::Module, TypeKind::Module)
        }
        (Language::CSharp, TypeDeclKind::Module) => {
            modifiers.is_static = true;
            (TypeDeclKind::Class, TypeKind::Module)
        }
        (_, other) => (*other, TypeKind::from(*other)),
    };
    let bases = bases.iter().map(|b| types::type_ref(ctx, b)).collect();
    let members = ctx.in_scope(decl.id, |ctx| {
        ctx.in_type(member_context, |ctx| ctx.convert_decls(members))
    });
    vec![ctx.at(decl.range).type_decl(kind, &name, modifiers, bases, members)]
}

pub fn field(decl: &Decl, ctx: &mut ConversionContext<'_>) -> Vec<Decl> {
    let DeclKind::Field {
        modifiers,
        declarators,
        is_const,
    } = &decl.kind
    else {
        return Vec::new();
    };
    let modifiers = member_modifiers(ctx, modifiers, false);
    match ctx.target {
        Language::VBNet => {
            let declarators = declarators
                .iter()
                .map(|d| stmts::declarator_to_vb(ctx, d))
                .collect();
            vec![ctx.at(decl.range).decl(DeclKind::Field {
                modifiers,
                declarators,
                is_const: *is_const,
            })]
        }
        // VB は一つの Dim に型の違う宣言子を書けるので、C# では分ける
        Language::CSharp => declarators
            .iter()
            .map(|d| {
                let converted = stmts::declarator_to_cs(ctx, d, false);
                ctx.at(decl.range).decl(DeclKind::Field {
                    modifiers: modifiers.clone(),
                    declarators: vec![converted],
                    is_const: *is_const,
                })
            })
            .collect(),
    }
}

pub fn method(decl: &Decl, ctx: &mut ConversionContext<'_>) -> Vec<Decl> {
    let DeclKind::Method {
        name,
        modifiers,
        params: method_params,
        return_type,
        body,
    } = &decl.kind
    else {
        return Vec::new();
    };
    let name = declared_name(ctx, decl, name);
    let modifiers = member_modifiers(ctx, modifiers, true);
    let (new_params, return_type, body) = ctx.in_scope(decl.id, |ctx| {
        let new_params = params(ctx, method_params);
        let return_type = types::opt_type_ref(ctx, return_type.as_ref());
        let body = ctx.in_member(return_type.clone(), |ctx| {
            body.as_ref().map(|b| ctx.convert_block(b))
        });
        (new_params, return_type, body)
    });
    vec![ctx.at(decl.range).decl(DeclKind::Method {
        name,
        modifiers,
        params: new_params,
        return_type,
        body,
    })]
}

pub fn property(decl: &Decl, ctx: &mut ConversionContext<'_>) -> Vec<Decl> {
    let DeclKind::Property {
        name,
        modifiers,
        ty,
        getter,
        setter,
    } = &decl.kind
    else {
        return Vec::new();
    };
    let name = declared_name(ctx, decl, name);
    let modifiers = member_modifiers(ctx, modifiers, true);
    let (ty, getter, setter) = ctx.in_scope(decl.id, |ctx| {
        let ty = types::type_ref(ctx, ty);
        let getter = ctx.in_member(Some(ty.clone()), |ctx| {
            getter.as_ref().map(|b| ctx.convert_block(b))
        });
        let setter = ctx.in_member(None, |ctx| setter.as_ref().map(|b| ctx.convert_block(b)));
        (ty, getter, setter)
    });
    vec![ctx.at(decl.range).decl(DeclKind::Property {
        name,
        modifiers,
        ty,
        getter,
        setter,
    })]
}

pub fn delegate(decl: &Decl, ctx: &mut ConversionContext<'_>) -> Vec<Decl> {
    let DeclKind::Delegate {
        name,
        modifiers,
        params: delegate_params,
        return_type,
    } = &decl.kind
    else {
        return Vec::new();
    };
    let name = declared_name(ctx, decl, name);
    let new_params = params(ctx, delegate_params);
    let return_type = types::opt_type_ref(ctx, return_type.as_ref());
    vec![ctx.at(decl.range).decl(DeclKind::Delegate {
        name,
        modifiers: modifiers.clone(),
        params: new_params,
        return_type,
    })]
}

//! semantic module tests

use super::*;
use crate::ast::{
    Access, AstBuilder, BinaryOp, Decl, DeclKind, Language, Modifiers, Stmt,
};
use crate::symbols::{
    BuiltinType, LibraryCatalog, LibraryDescription, ResolvedType, ScopeId, SymbolKind, SymbolModel,
    SymbolModelBuilder,
};
use std::sync::Arc;

/// Unit with one class `C` holding `members` and a method `T` whose body is
/// `body`; returns the model and the scope of the body
fn in_method(
    b: &AstBuilder,
    imports: &[&str],
    members: Vec<Decl>,
    body: Vec<Stmt>,
) -> (SymbolModel, ScopeId) {
    in_method_with(b, LibraryCatalog::core().unwrap(), imports, members, body)
}

fn in_method_with(
    b: &AstBuilder,
    library: LibraryCatalog,
    imports: &[&str],
    members: Vec<Decl>,
    body: Vec<Stmt>,
) -> (SymbolModel, ScopeId) {
    let method = b.method("T", body);
    let body_id = match &method.kind {
        DeclKind::Method { body: Some(body), .. } => body.id,
        _ => unreachable!(),
    };
    let mut members = members;
    members.push(method);
    let class = b.class("C", members);
    let imports = imports.iter().map(|i| b.import(i)).collect();
    let unit = b.unit(imports, vec![class]);
    let (model, _) = SymbolModelBuilder::new(Arc::new(library), b.language()).build(&unit);
    let scope = model.scope_of_node(body_id).unwrap();
    (model, scope)
}

fn click_event(b: &AstBuilder) -> Decl {
    b.event("Click", Modifiers::with_access(Access::Public), b.ty("EventHandler"))
}

// --- 等価比較の分類テスト ---

#[test]
fn test_int_equality_is_value() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![
        b.local("a", Some(b.ty("int")), Some(b.int(3))),
        b.local("b", Some(b.ty("int")), Some(b.int(4))),
    ];
    let (model, scope) = in_method(&b, &[], vec![], body);
    let resolver = Resolver::new(&model);
    let eq = b.binary(BinaryOp::Eq, b.ident("a"), b.ident("b"));
    let sem = resolver.semantics(&eq, scope);
    assert_eq!(sem.equality, Some(EqualityKind::Value));
    assert_eq!(sem.ty, ResolvedType::Builtin(BuiltinType::Bool));
}

#[test]
fn test_object_equality_is_identity() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![
        b.local("a", Some(b.ty("object")), Some(b.new_object(b.ty("object"), vec![]))),
        b.local("b", Some(b.ty("object")), Some(b.new_object(b.ty("object"), vec![]))),
    ];
    let (model, scope) = in_method(&b, &[], vec![], body);
    let resolver = Resolver::new(&model);
    let eq = b.binary(BinaryOp::Eq, b.ident("a"), b.ident("b"));
    assert_eq!(
        resolver.semantics(&eq, scope).equality,
        Some(EqualityKind::Identity)
    );
}

#[test]
fn test_string_equality_is_value() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![b.local("s", Some(b.ty("string")), Some(b.str_lit("x")))];
    let (model, scope) = in_method(&b, &[], vec![], body);
    let resolver = Resolver::new(&model);
    let eq = b.binary(BinaryOp::Eq, b.ident("s"), b.str_lit("y"));
    assert_eq!(resolver.semantics(&eq, scope).equality, Some(EqualityKind::Value));
}

#[test]
fn test_null_comparison_of_reference_is_identity() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![b.local("s", Some(b.ty("string")), None)];
    let (model, scope) = in_method(&b, &[], vec![], body);
    let resolver = Resolver::new(&model);
    let eq = b.binary(BinaryOp::NotEq, b.ident("s"), b.null());
    assert_eq!(
        resolver.semantics(&eq, scope).equality,
        Some(EqualityKind::Identity)
    );
}

#[test]
fn test_unknown_against_value_or_string_is_value_equality() {
    let b = AstBuilder::new(Language::CSharp);
    let (model, scope) = in_method(&b, &[], vec![], vec![]);
    let resolver = Resolver::new(&model);
    let with_int = b.binary(BinaryOp::Eq, b.ident("missing"), b.int(1));
    assert_eq!(
        resolver.semantics(&with_int, scope).equality,
        Some(EqualityKind::Value)
    );
    let with_string = b.binary(BinaryOp::Eq, b.str_lit("x"), b.ident("missing"));
    assert_eq!(
        resolver.semantics(&with_string, scope).equality,
        Some(EqualityKind::Value)
    );
}

#[test]
fn test_both_operands_unknown_is_unresolved() {
    let b = AstBuilder::new(Language::CSharp);
    let (model, scope) = in_method(&b, &[], vec![], vec![]);
    let resolver = Resolver::new(&model);
    let eq = b.binary(BinaryOp::Eq, b.ident("missing"), b.ident("other"));
    assert_eq!(
        resolver.semantics(&eq, scope).equality,
        Some(EqualityKind::Unresolved)
    );
}

// --- 名前解決テスト ---

#[test]
fn test_vb_lookup_ignores_case_and_reports_declared_symbol() {
    let b = AstBuilder::new(Language::VBNet);
    let (model, scope) = in_method(&b, &[], vec![], vec![]);
    let resolver = Resolver::new(&model);
    let expr = b.path("appdomain.getcurrentthreadid");
    let sem = resolver.semantics(&expr, scope);
    assert_eq!(sem.kind, ResolutionKind::MethodGroup);
    assert!(sem.implicit_call);
    assert_eq!(sem.ty, ResolvedType::Builtin(BuiltinType::Int32));
    assert_eq!(model.name_of(sem.symbol.unwrap()), "GetCurrentThreadId");
}

#[test]
fn test_csharp_lookup_is_case_sensitive() {
    let b = AstBuilder::new(Language::CSharp);
    let (model, scope) = in_method(&b, &["System"], vec![], vec![]);
    let resolver = Resolver::new(&model);
    assert!(resolver.resolve(&b.ident("appdomain"), scope).is_unresolved());
    assert_eq!(
        resolver.resolve(&b.ident("AppDomain"), scope).kind,
        ResolutionKind::Type
    );
}

#[test]
fn test_member_chain_through_call_and_index() {
    // appdomain.currentdomain.GetAssemblies()(1).location
    let b = AstBuilder::new(Language::VBNet);
    let (model, scope) = in_method(&b, &[], vec![], vec![]);
    let resolver = Resolver::new(&model);
    let call = b.call(b.path("appdomain.currentdomain.GetAssemblies"), vec![]);
    let indexed = b.call(call, vec![b.int(1)]);
    let sem = resolver.semantics(&indexed, scope);
    assert_eq!(sem.invocation, Some(InvocationKind::ElementAccess));
    let location = b.member(indexed, "location");
    let sem = resolver.semantics(&location, scope);
    assert_eq!(sem.ty, ResolvedType::Builtin(BuiltinType::String));
    assert_eq!(model.name_of(sem.symbol.unwrap()), "Location");
}

#[test]
fn test_vb_call_then_index_reading() {
    let b = AstBuilder::new(Language::VBNet);
    let (model, scope) = in_method(&b, &[], vec![], vec![]);
    let resolver = Resolver::new(&model);
    let expr = b.call(b.path("AppDomain.CurrentDomain.GetAssemblies"), vec![b.int(1)]);
    let sem = resolver.semantics(&expr, scope);
    assert_eq!(sem.invocation, Some(InvocationKind::IndexedCall));
    let assembly = model.library().by_qualified_name("System.Reflection.Assembly").unwrap();
    assert_eq!(sem.ty, ResolvedType::Named(assembly));
}

#[test]
fn test_array_call_syntax_is_element_access() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![b.local_array("i", b.ty("Integer"), vec![Some(b.int(10))])];
    let (model, scope) = in_method(&b, &[], vec![], body);
    let resolver = Resolver::new(&model);
    let expr = b.call(b.ident("i"), vec![b.int(4)]);
    let sem = resolver.semantics(&expr, scope);
    assert_eq!(sem.invocation, Some(InvocationKind::ElementAccess));
    assert_eq!(sem.ty, ResolvedType::Builtin(BuiltinType::Int32));
}

#[test]
fn test_default_property_invocation() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![b.local_as_new("list", b.ty("System.Collections.ArrayList"), vec![])];
    let (model, scope) = in_method(&b, &[], vec![], body);
    let resolver = Resolver::new(&model);
    let by_name = b.call(b.member(b.ident("list"), "Item"), vec![b.int(0)]);
    assert_eq!(
        resolver.semantics(&by_name, scope).invocation,
        Some(InvocationKind::DefaultProperty)
    );
    let direct = b.call(b.ident("list"), vec![b.int(0)]);
    assert_eq!(
        resolver.semantics(&direct, scope).invocation,
        Some(InvocationKind::ElementAccess)
    );
}

#[test]
fn test_overload_selected_by_arity() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![b.local("s", Some(b.ty("string")), Some(b.str_lit("abc")))];
    let (model, scope) = in_method(&b, &["System"], vec![], body);
    let resolver = Resolver::new(&model);
    let one = b.call(b.member(b.ident("s"), "Substring"), vec![b.int(1)]);
    let two = b.call(b.member(b.ident("s"), "Substring"), vec![b.int(1), b.int(1)]);
    let r1 = resolver.resolve(&one, scope);
    let r2 = resolver.resolve(&two, scope);
    assert_ne!(r1.symbol, r2.symbol);
    assert_eq!(r1.ty, ResolvedType::Builtin(BuiltinType::String));
    assert!(!r1.ambiguous);
}

#[test]
fn test_ambiguous_import_flagged() {
    let extra = LibraryDescription::from_json(
        r#"{"namespaces": [
            {"name": "Alpha", "types": [{"name": "Widget", "kind": "class"}]},
            {"name": "Beta", "types": [{"name": "Widget", "kind": "class"}]}
        ]}"#,
    )
    .unwrap();
    let library = LibraryCatalog::core_with(extra).unwrap();
    let b = AstBuilder::new(Language::CSharp);
    let (model, scope) = in_method_with(&b, library, &["Alpha", "Beta"], vec![], vec![]);
    let resolver = Resolver::new(&model);
    let r = resolver.resolve(&b.ident("Widget"), scope);
    assert!(r.ambiguous);
    assert_eq!(r.candidates.len(), 2);
}

// --- 演算の型テスト ---

#[test]
fn test_division_type_depends_on_language() {
    let vb = AstBuilder::new(Language::VBNet);
    let (model, scope) = in_method(&vb, &[], vec![], vec![]);
    let resolver = Resolver::new(&model);
    let div = vb.binary(BinaryOp::Div, vb.int(7), vb.int(2));
    assert_eq!(resolver.type_of(&div, scope), ResolvedType::Builtin(BuiltinType::Double));

    let cs = AstBuilder::new(Language::CSharp);
    let (model, scope) = in_method(&cs, &[], vec![], vec![]);
    let resolver = Resolver::new(&model);
    let div = cs.binary(BinaryOp::Div, cs.int(7), cs.int(2));
    assert_eq!(resolver.type_of(&div, scope), ResolvedType::Builtin(BuiltinType::Int32));
}

#[test]
fn test_string_plus_is_string() {
    let b = AstBuilder::new(Language::CSharp);
    let (model, scope) = in_method(&b, &[], vec![], vec![]);
    let resolver = Resolver::new(&model);
    let add = b.binary(BinaryOp::Add, b.str_lit("n = "), b.int(2));
    assert!(resolver.type_of(&add, scope).is_string());
}

// --- イベントのテスト ---

#[test]
fn test_event_invocation_classified_as_event() {
    let b = AstBuilder::new(Language::CSharp);
    let (model, scope) = in_method(&b, &["System"], vec![click_event(&b)], vec![]);
    let resolver = Resolver::new(&model);
    let call = b.call(b.ident("Click"), vec![b.this(), b.path("EventArgs.Empty")]);
    assert_eq!(
        resolver.semantics(&call, scope).invocation,
        Some(InvocationKind::Event)
    );
}

#[test]
fn test_guarded_and_unguarded_raise_match() {
    let b = AstBuilder::new(Language::CSharp);
    let (model, scope) = in_method(&b, &["System"], vec![click_event(&b)], vec![]);
    let resolver = Resolver::new(&model);

    let raise = || b.expr_stmt(b.call(b.ident("Click"), vec![b.this(), b.path("EventArgs.Empty")]));
    let guarded = b.if_stmt(
        b.binary(BinaryOp::NotEq, b.ident("Click"), b.null()),
        vec![raise()],
        None,
    );
    let unguarded = raise();

    let g = resolver.stmt_semantics(&guarded, scope).event_raise.unwrap();
    let u = resolver.stmt_semantics(&unguarded, scope).event_raise.unwrap();
    assert!(g.guarded);
    assert!(!u.guarded);
    assert_eq!(g.event, u.event);
    assert_eq!(model.symbol(g.event).unwrap().kind, SymbolKind::Event);
}

#[test]
fn test_guard_with_else_is_not_a_raise() {
    let b = AstBuilder::new(Language::CSharp);
    let (model, scope) = in_method(&b, &["System"], vec![click_event(&b)], vec![]);
    let resolver = Resolver::new(&model);
    let stmt = b.if_stmt(
        b.binary(BinaryOp::NotEq, b.ident("Click"), b.null()),
        vec![b.expr_stmt(b.call(b.ident("Click"), vec![b.this(), b.null()]))],
        Some(vec![]),
    );
    assert!(resolver.stmt_semantics(&stmt, scope).event_raise.is_none());
}

#[test]
fn test_invoke_form_is_a_raise() {
    let b = AstBuilder::new(Language::CSharp);
    let (model, scope) = in_method(&b, &["System"], vec![click_event(&b)], vec![]);
    let resolver = Resolver::new(&model);
    let stmt = b.expr_stmt(b.call(
        b.member(b.ident("Click"), "Invoke"),
        vec![b.this(), b.path("EventArgs.Empty")],
    ));
    assert!(resolver.stmt_semantics(&stmt, scope).event_raise.is_some());
}

#[test]
fn test_event_subscription_detected() {
    let b = AstBuilder::new(Language::CSharp);
    let (model, scope) = in_method(&b, &["System"], vec![click_event(&b)], vec![]);
    let resolver = Resolver::new(&model);
    let stmt = b.assign_op(b.ident("Click"), crate::ast::AssignOp::SubAssign, b.ident("OnClick"));
    let sub = resolver.stmt_semantics(&stmt, scope).event_subscription.unwrap();
    assert!(sub.remove);
}

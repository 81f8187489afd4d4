//! convert module tests

use super::*;
use crate::ast::{
    Access, AssignOp, BinaryOp, CastKind, CompilationUnit, Decl, DeclKind, ExprKind, Literal,
    Modifiers, StmtKind, TypeDeclKind, UnaryOp, VariableDeclarator,
};
use crate::diagnostics::DiagnosticKind;
use crate::symbols::{LibraryCatalog, SymbolModelBuilder};
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// Unit with one class `C` holding `members` and a method `T` whose body is `body`
fn unit_with_body(b: &AstBuilder, imports: &[&str], members: Vec<Decl>, body: Vec<Stmt>) -> CompilationUnit {
    let mut members = members;
    members.push(b.method("T", body));
    let class = b.class("C", members);
    let imports = imports.iter().map(|i| b.import(i)).collect();
    b.unit(imports, vec![class])
}

fn convert_with(b: &AstBuilder, unit: &CompilationUnit, options: &ConversionOptions) -> Converted {
    let library = Arc::new(LibraryCatalog::core().unwrap());
    let (model, _) = SymbolModelBuilder::new(library, b.language()).build(unit);
    convert_unit(unit, &model, b.language().counterpart(), options, Some("test")).unwrap()
}

fn convert(b: &AstBuilder, unit: &CompilationUnit) -> Converted {
    convert_with(b, unit, &ConversionOptions::default())
}

fn find_method<'u>(decls: &'u [Decl], name: &str) -> Option<&'u Block> {
    for d in decls {
        match &d.kind {
            DeclKind::Method {
                name: n,
                body: Some(body),
                ..
            } if n == name => return Some(body),
            DeclKind::Type { members, .. } | DeclKind::Namespace { members, .. } => {
                if let Some(found) = find_method(members, name) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

fn body_of<'u>(converted: &'u Converted, name: &str) -> &'u [Stmt] {
    &find_method(&converted.unit.members, name).unwrap().stmts
}

fn declarator(stmt: &Stmt) -> &VariableDeclarator {
    match &stmt.kind {
        StmtKind::Local { declarators, .. } => &declarators[0],
        other => panic!("expected a local, got {other:?}"),
    }
}

fn init(stmt: &Stmt) -> &Expr {
    declarator(stmt).init.as_ref().unwrap()
}

fn binary_op(expr: &Expr) -> BinaryOp {
    match &expr.kind {
        ExprKind::Binary { op, .. } => *op,
        other => panic!("expected a binary expression, got {other:?}"),
    }
}

fn int_value(expr: &Expr) -> i64 {
    expr.as_int_literal().unwrap()
}

fn click_event(b: &AstBuilder) -> Decl {
    b.event("Click", Modifiers::with_access(Access::Public), b.ty("EventHandler"))
}

// --- 等価比較 ---

#[test]
fn test_int_equality_stays_value_comparison() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![
        b.local("a", Some(b.ty("int")), Some(b.int(3))),
        b.local("b", Some(b.ty("int")), Some(b.int(4))),
        b.local(
            "same",
            Some(b.ty("bool")),
            Some(b.binary(BinaryOp::Eq, b.ident("a"), b.ident("b"))),
        ),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    assert_eq!(declarator(&stmts[0]).ty.as_ref().unwrap().name, "Integer");
    assert_eq!(binary_op(init(&stmts[2])), BinaryOp::Eq);
    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_object_equality_becomes_is() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![
        b.local("a", Some(b.ty("object")), Some(b.new_object(b.ty("object"), vec![]))),
        b.local("b", Some(b.ty("object")), Some(b.new_object(b.ty("object"), vec![]))),
        b.local(
            "same",
            Some(b.ty("bool")),
            Some(b.binary(BinaryOp::Eq, b.ident("a"), b.ident("b"))),
        ),
        b.local(
            "differ",
            Some(b.ty("bool")),
            Some(b.binary(BinaryOp::NotEq, b.ident("a"), b.ident("b"))),
        ),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    // `object a = new object()` → `Dim a As New Object()`
    assert!(declarator(&stmts[0]).as_new);
    assert_eq!(binary_op(init(&stmts[2])), BinaryOp::RefEq);
    assert_eq!(binary_op(init(&stmts[3])), BinaryOp::RefNotEq);
}

#[test]
fn test_unknown_operands_warn_and_use_identity() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![b.local(
        "same",
        Some(b.ty("bool")),
        Some(b.binary(BinaryOp::Eq, b.ident("mystery"), b.ident("other"))),
    )];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    assert_eq!(binary_op(init(&body_of(&out, "T")[0])), BinaryOp::RefEq);
    assert!(out
        .diagnostics
        .warnings()
        .any(|d| d.kind == DiagnosticKind::AmbiguousSemantics));
    assert!(!out.diagnostics.has_errors());
}

#[test]
fn test_value_or_string_against_unknown_stays_value_comparison() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![
        b.local("a", Some(b.ty("int")), Some(b.int(3))),
        b.local("s", Some(b.ty("string")), Some(b.str_lit("x"))),
        b.local(
            "r1",
            Some(b.ty("bool")),
            Some(b.binary(BinaryOp::Eq, b.ident("a"), b.ident("zz"))),
        ),
        b.local(
            "r2",
            Some(b.ty("bool")),
            Some(b.binary(BinaryOp::NotEq, b.ident("s"), b.ident("qq"))),
        ),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    assert_eq!(binary_op(init(&stmts[2])), BinaryOp::Eq);
    assert_eq!(binary_op(init(&stmts[3])), BinaryOp::NotEq);
    assert!(!out
        .diagnostics
        .warnings()
        .any(|d| d.kind == DiagnosticKind::AmbiguousSemantics));
}

// --- 大文字小文字 ---

#[test]
fn test_vb_names_take_declared_casing_and_call_parentheses() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![
        b.local("id", None, Some(b.path("appdomain.getcurrentthreadid"))),
        b.local("n", Some(b.ty("integer")), None),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");

    let d = declarator(&stmts[0]);
    assert_eq!(d.ty.as_ref().unwrap().name, "var");
    let ExprKind::Invocation { target, args } = &init(&stmts[0]).kind else {
        panic!("expected an implicit call");
    };
    assert!(args.is_empty());
    let ExprKind::MemberAccess { target: owner, member } = &target.kind else {
        panic!("expected a member access");
    };
    assert_eq!(member, "GetCurrentThreadId");
    assert_eq!(owner.as_identifier(), Some("AppDomain"));

    assert_eq!(declarator(&stmts[1]).ty.as_ref().unwrap().name, "int");
}

#[test]
fn test_vb_implicit_imports_written_out() {
    let b = AstBuilder::new(Language::VBNet);
    let unit = unit_with_body(&b, &["system.collections"], vec![], vec![]);
    let out = convert(&b, &unit);
    let namespaces: Vec<&str> = out.unit.imports.iter().map(|i| i.namespace.as_str()).collect();
    assert_eq!(
        namespaces,
        vec!["System", "Microsoft.VisualBasic", "System.Collections"]
    );
}

// --- 配列 ---

#[test]
fn test_vb_array_bound_becomes_length() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![b.local_array("i", b.ty("Integer"), vec![Some(b.int(10))])];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let d = declarator(&body_of(&out, "T")[0]);
    let ty = d.ty.as_ref().unwrap();
    assert_eq!(ty.name, "int");
    assert_eq!(ty.array_ranks, vec![1]);
    let ExprKind::ArrayCreation { dims, .. } = &d.init.as_ref().unwrap().kind else {
        panic!("expected an array creation");
    };
    assert_eq!(int_value(&dims[0]), 11);
}

#[test]
fn test_csharp_array_length_becomes_bound() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![b.local(
        "a",
        Some(b.array_ty("int", vec![1])),
        Some(b.new_array(b.ty("int"), vec![b.int(11)])),
    )];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let d = declarator(&body_of(&out, "T")[0]);
    assert_eq!(d.ty.as_ref().unwrap().name, "Integer");
    assert!(d.init.is_none());
    let bounds = d.bounds.as_ref().unwrap();
    assert_eq!(int_value(bounds[0].as_ref().unwrap()), 10);
}

#[test]
fn test_redim_without_preserve_reallocates() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![
        b.local_array("i", b.ty("Integer"), vec![Some(b.int(10))]),
        b.redim(false, b.ident("i"), vec![b.int(20)]),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let StmtKind::Assign { target, op, value } = &body_of(&out, "T")[1].kind else {
        panic!("expected an assignment");
    };
    assert_eq!(*op, AssignOp::Assign);
    assert_eq!(target.as_identifier(), Some("i"));
    let ExprKind::ArrayCreation { element, dims, .. } = &value.kind else {
        panic!("expected an array creation");
    };
    assert_eq!(element.name, "int");
    assert_eq!(int_value(&dims[0]), 21);
}

#[test]
fn test_redim_preserve_uses_array_resize() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![
        b.local_array("i", b.ty("Integer"), vec![Some(b.int(10))]),
        b.redim(true, b.ident("i"), vec![b.int(20)]),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let StmtKind::Expr(call) = &body_of(&out, "T")[1].kind else {
        panic!("expected a call statement");
    };
    let ExprKind::Invocation { target, args } = &call.kind else {
        panic!("expected an invocation");
    };
    assert!(matches!(&target.kind, ExprKind::MemberAccess { member, .. } if member == "Resize"));
    assert!(matches!(args[0].kind, ExprKind::RefArgument(_)));
    assert_eq!(int_value(&args[1]), 21);
}

#[test]
fn test_array_resize_becomes_redim_preserve() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![
        b.local(
            "a",
            Some(b.array_ty("int", vec![1])),
            Some(b.new_array(b.ty("int"), vec![b.int(11)])),
        ),
        b.expr_stmt(b.call(
            b.path("Array.Resize"),
            vec![b.ref_arg(b.ident("a")), b.int(21)],
        )),
    ];
    let unit = unit_with_body(&b, &["System"], vec![], body);
    let out = convert(&b, &unit);
    let StmtKind::ReDim { preserve, clauses } = &body_of(&out, "T")[1].kind else {
        panic!("expected ReDim");
    };
    assert!(*preserve);
    assert_eq!(clauses[0].target.as_identifier(), Some("a"));
    assert_eq!(int_value(&clauses[0].bounds[0]), 20);
}

#[test]
fn test_extreme_bound_is_not_folded() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![b.local_array("i", b.ty("Integer"), vec![Some(b.int(i64::MAX))])];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let d = declarator(&body_of(&out, "T")[0]);
    let ExprKind::ArrayCreation { dims, .. } = &d.init.as_ref().unwrap().kind else {
        panic!("expected an array creation");
    };
    let ExprKind::Binary { op, left, right } = &dims[0].kind else {
        panic!("expected the bound plus one");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert_eq!(int_value(left), i64::MAX);
    assert_eq!(int_value(right), 1);
}

#[test]
fn test_unsized_two_dimensional_array_then_redim() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![
        b.local_array("MyArray", b.ty("Integer"), vec![None, None]),
        b.redim(false, b.ident("MyArray"), vec![b.int(5), b.int(5)]),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");

    let d = declarator(&stmts[0]);
    assert_eq!(d.ty.as_ref().unwrap().array_ranks, vec![2]);
    assert!(d.init.as_ref().unwrap().is_null_literal());

    let StmtKind::Assign { value, .. } = &stmts[1].kind else {
        panic!("expected an assignment");
    };
    let ExprKind::ArrayCreation { element, dims, .. } = &value.kind else {
        panic!("expected an array creation");
    };
    assert_eq!(element.name, "int");
    let lengths: Vec<i64> = dims.iter().map(int_value).collect();
    assert_eq!(lengths, vec![6, 6]);
}

#[test]
fn test_redim_preserve_two_dimensions_copies_array() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![
        b.local_array("MyArray", b.ty("Integer"), vec![Some(b.int(5)), Some(b.int(5))]),
        b.redim(true, b.ident("MyArray"), vec![b.int(10), b.int(10)]),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let StmtKind::Assign { target, value, .. } = &body_of(&out, "T")[1].kind else {
        panic!("expected an assignment");
    };
    assert_eq!(target.as_identifier(), Some("MyArray"));
    let ExprKind::Cast { ty, expr, .. } = &value.kind else {
        panic!("expected a cast");
    };
    assert_eq!(ty.name, "int");
    assert_eq!(ty.array_ranks, vec![2]);
    let ExprKind::Invocation { target: callee, args } = &expr.kind else {
        panic!("expected a call");
    };
    assert!(matches!(&callee.kind, ExprKind::MemberAccess { member, .. } if member == "CopyArray"));
    assert_eq!(args[0].as_identifier(), Some("MyArray"));
    let ExprKind::ArrayCreation { dims, .. } = &args[1].kind else {
        panic!("expected a fresh array");
    };
    let lengths: Vec<i64> = dims.iter().map(int_value).collect();
    assert_eq!(lengths, vec![11, 11]);
}

// --- イベント ---

#[test]
fn test_guarded_and_unguarded_raise_convert_identically() {
    let b = AstBuilder::new(Language::CSharp);
    let raise = || b.expr_stmt(b.call(b.ident("Click"), vec![b.this(), b.path("EventArgs.Empty")]));
    let guarded = b.if_stmt(
        b.binary(BinaryOp::NotEq, b.ident("Click"), b.null()),
        vec![raise()],
        None,
    );
    let unit = unit_with_body(&b, &["System"], vec![click_event(&b)], vec![guarded, raise()]);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    assert_eq!(stmts.len(), 2);
    for stmt in stmts {
        let StmtKind::RaiseEvent { event, args } = &stmt.kind else {
            panic!("expected RaiseEvent, got {:?}", stmt.kind);
        };
        assert_eq!(event, "Click");
        assert_eq!(args.len(), 2);
        assert!(matches!(args[0].kind, ExprKind::This));
    }
}

#[test]
fn test_guarded_raise_maps_guard_and_call_to_raise_event() {
    let b = AstBuilder::new(Language::CSharp);
    let cond = b.binary(BinaryOp::NotEq, b.ident("Click"), b.null());
    let cond_id = cond.id;
    let call = b.expr_stmt(b.call(b.ident("Click"), vec![b.this(), b.path("EventArgs.Empty")]));
    let call_id = call.id;
    let guarded = b.if_stmt(cond, vec![call], None);
    let if_id = guarded.id;
    let unit = unit_with_body(&b, &["System"], vec![click_event(&b)], vec![guarded]);
    let out = convert(&b, &unit);

    let raise = &body_of(&out, "T")[0];
    assert!(matches!(raise.kind, StmtKind::RaiseEvent { .. }));
    assert_eq!(out.node_map.produced_from(call_id), &[raise.id]);
    assert_eq!(out.node_map.produced_from(cond_id), &[raise.id]);
    assert_eq!(out.node_map.original_of(raise.id), Some(if_id));
}

#[test]
fn test_raise_event_becomes_null_checked_call() {
    let b = AstBuilder::new(Language::VBNet);
    let event = b.event_with_params(
        "Changed",
        Modifiers::default(),
        vec![b.param("sender", b.ty("Object"))],
    );
    let body = vec![b.raise_event("changed", vec![b.this()])];
    let unit = unit_with_body(&b, &[], vec![event], body);
    let out = convert(&b, &unit);

    let StmtKind::If {
        cond,
        then_block,
        else_block,
    } = &body_of(&out, "T")[0].kind
    else {
        panic!("expected a guard");
    };
    assert!(else_block.is_none());
    let ExprKind::Binary { op, left, right } = &cond.kind else {
        panic!("expected a null comparison");
    };
    assert_eq!(*op, BinaryOp::NotEq);
    assert_eq!(left.as_identifier(), Some("Changed"));
    assert!(right.is_null_literal());
    let StmtKind::Expr(call) = &then_block.stmts[0].kind else {
        panic!("expected a call");
    };
    assert!(matches!(&call.kind, ExprKind::Invocation { target, .. } if target.as_identifier() == Some("Changed")));
}

#[test]
fn test_vb_event_with_params_gets_delegate() {
    let b = AstBuilder::new(Language::VBNet);
    let event = b.event_with_params(
        "Changed",
        Modifiers::default(),
        vec![b.param("sender", b.ty("Object"))],
    );
    let unit = unit_with_body(&b, &[], vec![event], vec![]);
    let out = convert(&b, &unit);
    let DeclKind::Type { members, .. } = &out.unit.members[0].kind else {
        panic!("expected the class");
    };
    let DeclKind::Delegate { name, params, .. } = &members[0].kind else {
        panic!("expected a delegate");
    };
    assert_eq!(name, "ChangedEventHandler");
    assert_eq!(params[0].ty.name, "object");
    let DeclKind::Event { ty, modifiers, .. } = &members[1].kind else {
        panic!("expected the event");
    };
    assert_eq!(ty.as_ref().unwrap().name, "ChangedEventHandler");
    assert_eq!(modifiers.access, Some(Access::Public));
}

#[test]
fn test_event_subscription_becomes_add_handler() {
    let b = AstBuilder::new(Language::CSharp);
    let handler = b.method_full(
        "OnClick",
        Modifiers::with_access(Access::Private),
        vec![
            b.param("sender", b.ty("object")),
            b.param("e", b.ty("EventArgs")),
        ],
        None,
        vec![],
    );
    let body = vec![b.assign_op(b.ident("Click"), AssignOp::AddAssign, b.ident("OnClick"))];
    let unit = unit_with_body(&b, &["System"], vec![click_event(&b), handler], body);
    let out = convert(&b, &unit);
    let StmtKind::AddHandler {
        event,
        handler,
        remove,
    } = &body_of(&out, "T")[0].kind
    else {
        panic!("expected AddHandler");
    };
    assert!(!remove);
    assert_eq!(event.as_identifier(), Some("Click"));
    assert!(matches!(&handler.kind, ExprKind::AddressOf(inner) if inner.as_identifier() == Some("OnClick")));
}

// --- 対応のない構文 ---

#[test]
fn test_on_error_becomes_placeholder_with_one_error() {
    let b = AstBuilder::new(Language::VBNet);
    let on_error = b.stmt(StmtKind::OnError {
        label: "Handler".to_string(),
    });
    let original = on_error.id;
    let body = vec![on_error, b.local("x", Some(b.ty("Integer")), Some(b.int(1)))];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");

    let StmtKind::Unsupported(placeholder) = &stmts[0].kind else {
        panic!("expected a placeholder");
    };
    assert_eq!(placeholder.kind, "OnError");
    assert_eq!(placeholder.original, original);
    // 後続の文は通常どおり変換される
    assert_eq!(declarator(&stmts[1]).ty.as_ref().unwrap().name, "int");

    let errors: Vec<_> = out.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, DiagnosticKind::UnsupportedConstruct);
    assert_eq!(errors[0].span.file.as_deref(), Some("test"));
}

#[test]
fn test_xml_literal_becomes_placeholder_expression() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![
        b.local("doc", None, Some(b.expr(ExprKind::XmlLiteral("<a/>".to_string())))),
        b.local("n", Some(b.ty("Integer")), Some(b.int(2))),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    assert!(matches!(
        &init(&stmts[0]).kind,
        ExprKind::Unsupported(p) if p.kind == "XmlLiteral"
    ));
    assert_eq!(int_value(init(&stmts[1])), 2);
    assert_eq!(out.diagnostics.errors().count(), 1);
}

#[test]
fn test_increment_inside_expression_is_unsupported_in_vb() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![
        b.local("i", Some(b.ty("int")), Some(b.int(0))),
        b.local(
            "j",
            Some(b.ty("int")),
            Some(b.unary(UnaryOp::PostIncrement, b.ident("i"))),
        ),
        b.expr_stmt(b.unary(UnaryOp::PostIncrement, b.ident("i"))),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    assert!(matches!(init(&stmts[1]).kind, ExprKind::Unsupported(_)));
    // 文としての `i++` は `i += 1`
    let StmtKind::Assign { op, value, .. } = &stmts[2].kind else {
        panic!("expected a compound assignment");
    };
    assert_eq!(*op, AssignOp::AddAssign);
    assert_eq!(int_value(value), 1);
    assert_eq!(out.diagnostics.errors().count(), 1);
}

// --- Module / static class ---

#[test]
fn test_module_becomes_static_class() {
    let b = AstBuilder::new(Language::VBNet);
    let module = b.type_decl(
        TypeDeclKind::Module,
        "Util",
        Modifiers::default(),
        vec![],
        vec![b.method("Run", vec![])],
    );
    let unit = b.unit(vec![], vec![module]);
    let out = convert(&b, &unit);
    let DeclKind::Type {
        kind,
        modifiers,
        members,
        ..
    } = &out.unit.members[0].kind
    else {
        panic!("expected a type");
    };
    assert_eq!(*kind, TypeDeclKind::Class);
    assert!(modifiers.is_static);
    let DeclKind::Method { modifiers, .. } = &members[0].kind else {
        panic!("expected a method");
    };
    assert!(modifiers.is_static);
    assert_eq!(modifiers.access, Some(Access::Public));
}

#[test]
fn test_static_class_becomes_module() {
    let b = AstBuilder::new(Language::CSharp);
    let run = b.method_full(
        "Run",
        Modifiers {
            access: Some(Access::Public),
            is_static: true,
            ..Default::default()
        },
        vec![],
        None,
        vec![],
    );
    let class = b.type_decl(
        TypeDeclKind::Class,
        "Util",
        Modifiers {
            is_static: true,
            ..Default::default()
        },
        vec![],
        vec![run],
    );
    let unit = b.unit(vec![], vec![class]);
    let out = convert(&b, &unit);
    let DeclKind::Type {
        kind,
        modifiers,
        members,
        ..
    } = &out.unit.members[0].kind
    else {
        panic!("expected a type");
    };
    assert_eq!(*kind, TypeDeclKind::Module);
    assert!(!modifiers.is_static);
    let DeclKind::Method { modifiers, .. } = &members[0].kind else {
        panic!("expected a method");
    };
    assert!(!modifiers.is_static);
}

#[test]
fn test_csharp_members_default_to_private() {
    let b = AstBuilder::new(Language::CSharp);
    let unit = unit_with_body(&b, &[], vec![], vec![]);
    let out = convert(&b, &unit);
    let DeclKind::Type { members, .. } = &out.unit.members[0].kind else {
        panic!("expected the class");
    };
    let DeclKind::Method { modifiers, .. } = &members[0].kind else {
        panic!("expected a method");
    };
    assert_eq!(modifiers.access, Some(Access::Private));
}

// --- 演算子 ---

#[test]
fn test_vb_operators_to_csharp() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![
        b.local("s", None, Some(b.binary(BinaryOp::Concat, b.str_lit("n = "), b.int(1)))),
        b.local("q", None, Some(b.binary(BinaryOp::IntDiv, b.int(7), b.int(2)))),
        b.local("r", None, Some(b.binary(BinaryOp::Div, b.int(7), b.int(2)))),
        b.local("p", None, Some(b.binary(BinaryOp::Pow, b.int(2), b.int(3)))),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");

    assert_eq!(binary_op(init(&stmts[0])), BinaryOp::Add);
    assert_eq!(binary_op(init(&stmts[1])), BinaryOp::Div);

    let ExprKind::Binary { op, left, .. } = &init(&stmts[2]).kind else {
        panic!("expected a division");
    };
    assert_eq!(*op, BinaryOp::Div);
    let ExprKind::Cast { kind, ty, .. } = &left.kind else {
        panic!("expected a cast to floating point");
    };
    assert_eq!(*kind, CastKind::Cast);
    assert_eq!(ty.name, "double");

    let ExprKind::Invocation { target, args } = &init(&stmts[3]).kind else {
        panic!("expected Math.Pow");
    };
    assert!(matches!(&target.kind, ExprKind::MemberAccess { member, .. } if member == "Pow"));
    assert_eq!(args.len(), 2);
}

#[test]
fn test_csharp_operators_to_vb() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![
        b.local("flag", Some(b.ty("bool")), Some(b.bool_lit(true))),
        b.local("mask", Some(b.ty("int")), Some(b.int(6))),
        b.local("s", Some(b.ty("string")), Some(b.binary(BinaryOp::Add, b.str_lit("a"), b.int(1)))),
        b.local("q", Some(b.ty("int")), Some(b.binary(BinaryOp::Div, b.int(7), b.int(2)))),
        b.local("t", Some(b.ty("bool")), Some(b.unary(UnaryOp::Not, b.ident("flag")))),
        b.local("m", Some(b.ty("int")), Some(b.unary(UnaryOp::BitNot, b.ident("mask")))),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    assert_eq!(binary_op(init(&stmts[2])), BinaryOp::Concat);
    assert_eq!(binary_op(init(&stmts[3])), BinaryOp::IntDiv);
    for stmt in &stmts[4..] {
        assert!(matches!(
            init(stmt).kind,
            ExprKind::Unary {
                op: UnaryOp::Not,
                ..
            }
        ));
    }
}

#[test]
fn test_string_compound_add_becomes_concat_assign() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![
        b.local("s", Some(b.ty("string")), Some(b.str_lit("a"))),
        b.assign_op(b.ident("s"), AssignOp::AddAssign, b.str_lit("b")),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    assert!(matches!(
        body_of(&out, "T")[1].kind,
        StmtKind::Assign {
            op: AssignOp::ConcatAssign,
            ..
        }
    ));
}

#[test]
fn test_cast_kind_follows_target_type() {
    let b = AstBuilder::new(Language::CSharp);
    let body = vec![
        b.local("o", Some(b.ty("object")), Some(b.int(1))),
        b.local("n", Some(b.ty("int")), Some(b.cast(CastKind::Cast, b.ty("int"), b.ident("o")))),
        b.local("s", Some(b.ty("string")), Some(b.cast(CastKind::Cast, b.ty("string"), b.ident("o")))),
        b.local("t", Some(b.ty("string")), Some(b.cast(CastKind::As, b.ty("string"), b.ident("o")))),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    let kinds: Vec<CastKind> = stmts[1..]
        .iter()
        .map(|s| match &init(s).kind {
            ExprKind::Cast { kind, .. } => *kind,
            other => panic!("expected a cast, got {other:?}"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![CastKind::CType, CastKind::DirectCast, CastKind::TryCast]
    );
}

// --- ループ ---

fn counting_loop(b: &AstBuilder, cmp: BinaryOp, body: Vec<Stmt>) -> Stmt {
    b.stmt(StmtKind::CFor {
        init: vec![b.local("i", Some(b.ty("int")), Some(b.int(0)))],
        cond: Some(b.binary(cmp, b.ident("i"), b.int(10))),
        iterators: vec![b.expr_stmt(b.unary(UnaryOp::PostIncrement, b.ident("i")))],
        body: b.block(body),
    })
}

#[test]
fn test_canonical_for_becomes_for_to() {
    let b = AstBuilder::new(Language::CSharp);
    let for_stmt = counting_loop(&b, BinaryOp::Lt, vec![b.stmt(StmtKind::Exit { target: None })]);
    let unit = unit_with_body(&b, &[], vec![], vec![for_stmt]);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    assert_eq!(stmts.len(), 1);
    let StmtKind::For {
        var,
        var_type,
        start,
        end,
        step,
        body,
    } = &stmts[0].kind
    else {
        panic!("expected For, got {:?}", stmts[0].kind);
    };
    assert_eq!(var, "i");
    assert_eq!(var_type.as_ref().unwrap().name, "Integer");
    assert_eq!(int_value(start), 0);
    assert_eq!(int_value(end), 9);
    assert!(step.is_none());
    assert!(matches!(
        body.stmts[0].kind,
        StmtKind::Exit {
            target: Some(JumpTarget::For)
        }
    ));
}

#[test]
fn test_non_canonical_for_becomes_while() {
    let b = AstBuilder::new(Language::CSharp);
    let for_stmt = counting_loop(&b, BinaryOp::NotEq, vec![]);
    let unit = unit_with_body(&b, &[], vec![], vec![for_stmt]);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    assert_eq!(stmts.len(), 2);
    assert!(matches!(stmts[0].kind, StmtKind::Local { .. }));
    let StmtKind::While { cond, body } = &stmts[1].kind else {
        panic!("expected While");
    };
    assert_eq!(binary_op(cond), BinaryOp::NotEq);
    assert!(matches!(
        body.stmts.last().unwrap().kind,
        StmtKind::Assign {
            op: AssignOp::AddAssign,
            ..
        }
    ));
}

#[test]
fn test_continue_in_rewritten_for_warns() {
    let b = AstBuilder::new(Language::CSharp);
    let for_stmt = counting_loop(&b, BinaryOp::NotEq, vec![b.stmt(StmtKind::Continue { target: None })]);
    let unit = unit_with_body(&b, &[], vec![], vec![for_stmt]);
    let out = convert(&b, &unit);
    assert_eq!(
        out.diagnostics
            .warnings()
            .filter(|d| d.kind == DiagnosticKind::AmbiguousSemantics)
            .count(),
        1
    );
}

#[test]
fn test_vb_for_becomes_c_style_for() {
    let b = AstBuilder::new(Language::VBNet);
    let up = b.stmt(StmtKind::For {
        var: "i".to_string(),
        var_type: Some(b.ty("Integer")),
        start: b.int(0),
        end: b.int(9),
        step: None,
        body: b.block(vec![]),
    });
    let down = b.stmt(StmtKind::For {
        var: "j".to_string(),
        var_type: Some(b.ty("Integer")),
        start: b.int(10),
        end: b.int(0),
        step: Some(b.int(-2)),
        body: b.block(vec![]),
    });
    let unit = unit_with_body(&b, &[], vec![], vec![up, down]);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");

    let StmtKind::CFor {
        init: up_init,
        cond: Some(up_cond),
        iterators: up_iter,
        ..
    } = &stmts[0].kind
    else {
        panic!("expected for");
    };
    assert_eq!(declarator(&up_init[0]).ty.as_ref().unwrap().name, "int");
    assert_eq!(binary_op(up_cond), BinaryOp::LtEq);
    assert!(matches!(
        &up_iter[0].kind,
        StmtKind::Expr(e) if matches!(e.kind, ExprKind::Unary { op: UnaryOp::PostIncrement, .. })
    ));

    let StmtKind::CFor {
        cond: Some(down_cond),
        iterators: down_iter,
        ..
    } = &stmts[1].kind
    else {
        panic!("expected for");
    };
    assert_eq!(binary_op(down_cond), BinaryOp::GtEq);
    let StmtKind::Assign { op, value, .. } = &down_iter[0].kind else {
        panic!("expected a compound assignment");
    };
    assert_eq!(*op, AssignOp::SubAssign);
    assert_eq!(int_value(value), 2);
}

#[test]
fn test_exit_function_returns_default() {
    let b = AstBuilder::new(Language::VBNet);
    let f = b.method_full(
        "F",
        Modifiers::default(),
        vec![],
        Some(b.ty("Integer")),
        vec![b.stmt(StmtKind::Exit {
            target: Some(JumpTarget::Function),
        })],
    );
    let unit = unit_with_body(&b, &[], vec![f], vec![]);
    let out = convert(&b, &unit);
    let StmtKind::Return(Some(value)) = &body_of(&out, "F")[0].kind else {
        panic!("expected return");
    };
    assert!(matches!(&value.kind, ExprKind::DefaultValue(ty) if ty.name == "int"));
}

// --- ローカル変数の既定値 ---

#[test]
fn test_uninitialized_locals_get_vb_defaults() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![
        b.local("n", Some(b.ty("Integer")), None),
        b.local("s", Some(b.ty("String")), None),
        b.local("flag", Some(b.ty("Boolean")), None),
        b.local("o", None, None),
    ];
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    assert_eq!(int_value(init(&stmts[0])), 0);
    assert!(init(&stmts[1]).is_null_literal());
    assert!(matches!(init(&stmts[2]).kind, ExprKind::Literal(Literal::Bool(false))));
    assert_eq!(declarator(&stmts[3]).ty.as_ref().unwrap().name, "object");
    assert!(init(&stmts[3]).is_null_literal());

    let options = ConversionOptions {
        initialize_locals: false,
        ..Default::default()
    };
    let out = convert_with(&b, &unit, &options);
    assert!(declarator(&body_of(&out, "T")[0]).init.is_none());
}

#[test]
fn test_multiple_vb_declarators_split_in_csharp() {
    let b = AstBuilder::new(Language::VBNet);
    let local = b.local_decl(
        vec![
            b.declarator("a", Some(b.ty("Integer")), Some(b.int(1))),
            b.declarator("s", Some(b.ty("String")), Some(b.str_lit("x"))),
        ],
        false,
    );
    let unit = unit_with_body(&b, &[], vec![], vec![local]);
    let out = convert(&b, &unit);
    let stmts = body_of(&out, "T");
    assert_eq!(stmts.len(), 2);
    assert_eq!(declarator(&stmts[0]).ty.as_ref().unwrap().name, "int");
    assert_eq!(declarator(&stmts[1]).ty.as_ref().unwrap().name, "string");
}

// --- 対応表と言語の組 ---

#[test]
fn test_node_map_links_every_statement() {
    let b = AstBuilder::new(Language::VBNet);
    let body = vec![
        b.local("a", Some(b.ty("Integer")), Some(b.int(1))),
        b.local_decl(
            vec![
                b.declarator("x", Some(b.ty("Integer")), None),
                b.declarator("y", Some(b.ty("Integer")), None),
            ],
            false,
        ),
    ];
    let ids: Vec<NodeId> = body.iter().map(|s| s.id).collect();
    let unit = unit_with_body(&b, &[], vec![], body);
    let out = convert(&b, &unit);
    assert_eq!(out.node_map.produced_from(ids[0]).len(), 1);
    assert_eq!(out.node_map.produced_from(ids[1]).len(), 2);
    for produced in out.node_map.produced_from(ids[1]) {
        assert_eq!(out.node_map.original_of(*produced), Some(ids[1]));
    }
    assert_eq!(out.node_map.original_of(out.unit.id), Some(unit.id));
}

#[test]
fn test_output_ids_do_not_collide_with_input() {
    let b = AstBuilder::new(Language::CSharp);
    let unit = unit_with_body(&b, &[], vec![], vec![b.local("a", Some(b.ty("int")), Some(b.int(1)))]);
    let out = convert(&b, &unit);
    assert!(out.unit.id.0 > crate::ast::visit::max_node_id(&unit));
}

#[test]
fn test_same_language_is_rejected() {
    let b = AstBuilder::new(Language::CSharp);
    let unit = unit_with_body(&b, &[], vec![], vec![]);
    let library = Arc::new(LibraryCatalog::core().unwrap());
    let (model, _) = SymbolModelBuilder::new(library, Language::CSharp).build(&unit);
    let options = ConversionOptions::default();
    let err = convert_unit(&unit, &model, Language::CSharp, &options, None).unwrap_err();
    assert!(matches!(err, ConvertError::InvalidLanguagePair { .. }));
}

#[test]
fn test_rule_registered_for_both_directions() {
    for (src, dst) in [
        (Language::CSharp, Language::VBNet),
        (Language::VBNet, Language::CSharp),
    ] {
        assert!(STANDARD_RULES.expr_rule(NodeKind::Binary, src, dst).is_some());
        assert!(STANDARD_RULES.stmt_rule(NodeKind::Local, src, dst).is_some());
    }
}

//! Expression and pattern checking.
//!
//! [`TypeChecker::infer_exp`] synthesizes a type; [`TypeChecker::check_exp`] pushes an expected type into the forms
//! that can use it (literals, blocks, conditionals, tuples, arrays, options, arithmetic) and falls back to
//! inference plus a subtype test everywhere else. Both record the resulting type for the expression's id.

use std::collections::HashMap;

use motoko_core::lang::codes;
use motoko_core::lang::prims::PrimTypeId;
use motoko_syntax::ast::*;

use super::prims::{LiteralFit, builtin_member, lit_type, nat_literal_fit};
use super::{BodyContext, TypeChecker};
use crate::frontend::semantic::DotBinding;
use crate::frontend::types::{Field, FuncType, Type, equivalent, infer_type_args, is_subtype};

impl TypeChecker<'_> {
    // ========================================================================
    // Entry points
    // ========================================================================

    pub(crate) fn infer_exp(&mut self, exp: &Exp) -> Type {
        let ty = self.infer_kind(exp);
        self.record(exp.id, &ty);
        ty
    }

    /// Check `exp` against `expected` and return the type recorded for it.
    pub(crate) fn check_exp(&mut self, exp: &Exp, expected: &Type) -> Type {
        if expected.is_error() {
            return self.infer_exp(exp);
        }
        let checked = match &exp.kind {
            ExpKind::Lit(Lit::Nat(digits)) => self.check_nat_literal(digits, false, expected, exp.span),
            ExpKind::Unary(UnOp::Neg, inner) if matches!(inner.kind, ExpKind::Lit(Lit::Nat(_))) => {
                let ExpKind::Lit(Lit::Nat(digits)) = &inner.kind else {
                    return self.infer_exp(exp);
                };
                let ty = self.check_nat_literal(digits, true, expected, exp.span);
                if let Some(ty) = &ty {
                    self.record(inner.id, ty);
                }
                ty
            }
            ExpKind::Block(decs) => {
                self.push_frame(!self.bodies.is_empty());
                self.check_decs(decs, Some(expected), false);
                self.pop_frame();
                Some(expected.clone())
            }
            ExpKind::If(cond, then, Some(els)) => {
                self.check_exp(cond, &Type::BOOL);
                self.check_exp(then, expected);
                self.check_exp(els, expected);
                Some(expected.clone())
            }
            ExpKind::Switch(scrutinee, cases) => {
                let scrutinee_ty = self.infer_exp(scrutinee);
                for case in cases {
                    self.push_frame(!self.bodies.is_empty());
                    self.bind_pat(&case.pat, &scrutinee_ty);
                    self.check_exp(&case.exp, expected);
                    self.pop_frame();
                }
                Some(expected.clone())
            }
            ExpKind::Binary(lhs, op, rhs) if *op != BinOp::Cat && expected.is_numeric() => {
                self.check_exp(lhs, expected);
                self.check_exp(rhs, expected);
                Some(expected.clone())
            }
            _ => match (&exp.kind, expected.normalize()) {
                (ExpKind::Tuple(elems), Type::Tuple(items)) if elems.len() == items.len() => {
                    for (elem, item) in elems.iter().zip(&items) {
                        self.check_exp(elem, item);
                    }
                    Some(expected.clone())
                }
                (ExpKind::Array { mutable, elems }, Type::Array(want_mut, elem_ty)) if *mutable == want_mut => {
                    for elem in elems {
                        self.check_exp(elem, &elem_ty);
                    }
                    Some(expected.clone())
                }
                (ExpKind::Opt(inner), Type::Opt(inner_ty)) => {
                    self.check_exp(inner, &inner_ty);
                    Some(expected.clone())
                }
                (ExpKind::Async(body), Type::Async(inner_ty)) => {
                    self.check_async_body(body, &inner_ty);
                    Some(expected.clone())
                }
                _ => None,
            },
        };

        match checked {
            Some(ty) => {
                self.record(exp.id, &ty);
                ty
            }
            None => {
                let actual = self.infer_exp(exp);
                if !is_subtype(&actual, expected) {
                    self.mismatch(&actual, expected, exp.span);
                }
                actual
            }
        }
    }

    /// Check a natural literal against a numeric type. `None` when `expected` is not numeric (fall back to
    /// inference and subtyping).
    fn check_nat_literal(&mut self, digits: &str, negated: bool, expected: &Type, span: Span) -> Option<Type> {
        let target = expected.as_prim()?;
        match nat_literal_fit(digits, negated, target) {
            LiteralFit::Fits => Some(expected.clone()),
            LiteralFit::NotNumeric => None,
            LiteralFit::OutOfRange => {
                let (sign, literal) = if negated { ("-", Type::INT) } else { ("", Type::NAT) };
                self.error(
                    codes::TYPE_MISMATCH,
                    format!(
                        "literal of type\n  {literal}\ndoes not have expected type\n  {expected}\n({sign}{digits} is out of range)"
                    ),
                    span,
                );
                Some(Type::Error)
            }
        }
    }

    // ========================================================================
    // Inference
    // ========================================================================

    fn infer_kind(&mut self, exp: &Exp) -> Type {
        match &exp.kind {
            ExpKind::Lit(lit) => lit_type(lit),
            ExpKind::Var(name) => match self.lookup_value(name) {
                Some(binding) => binding.ty,
                None => {
                    self.error(codes::UNBOUND_VARIABLE, format!("unbound variable {name}"), exp.span);
                    Type::Error
                }
            },
            ExpKind::Unary(op, operand) => self.infer_unary(*op, operand, exp.span),
            ExpKind::Binary(lhs, op, rhs) => self.infer_binary(lhs, *op, rhs, exp.span),
            ExpKind::Compare(lhs, op, rhs) => {
                let (lt, rt) = self.infer_operands(lhs, rhs);
                let joined = lt.lub(&rt);
                let ordered = !matches!(op, RelOp::Eq | RelOp::Neq);
                let comparable = match joined.normalize() {
                    Type::Error => true,
                    Type::Prim(PrimTypeId::Bool | PrimTypeId::Null) => !ordered,
                    Type::Prim(_) => true,
                    Type::Any | Type::Func(_) | Type::Async(_) => false,
                    _ => !ordered,
                };
                if !comparable {
                    self.operator_undefined(&lt, &rt, exp.span);
                }
                Type::BOOL
            }
            ExpKind::And(lhs, rhs) | ExpKind::Or(lhs, rhs) => {
                self.check_exp(lhs, &Type::BOOL);
                self.check_exp(rhs, &Type::BOOL);
                Type::BOOL
            }
            ExpKind::Assign(target, value) => {
                let target_ty = self.assign_target(target);
                self.check_exp(value, &target_ty);
                Type::unit()
            }
            ExpKind::OpAssign(target, op, value) => {
                let target_ty = self.assign_target(target);
                let value_ty = self.check_exp(value, &target_ty);
                if !target_ty.is_error() && !value_ty.is_error() && !operator_applies(*op, &target_ty) {
                    self.operator_undefined(&target_ty, &value_ty, exp.span);
                }
                Type::unit()
            }
            ExpKind::Tuple(elems) => Type::Tuple(elems.iter().map(|e| self.infer_exp(e)).collect()),
            ExpKind::Record(fields) => {
                let fields = fields
                    .iter()
                    .map(|field| Field {
                        name: field.name.node.clone(),
                        ty: self.infer_exp(&field.exp),
                        mutable: field.mutable,
                    })
                    .collect();
                Type::obj(ObjSort::Object, fields)
            }
            ExpKind::Array { mutable, elems } => {
                let elem = elems
                    .iter()
                    .fold(Type::Non, |acc, e| {
                        let ty = self.infer_exp(e);
                        acc.lub(&ty)
                    });
                Type::Array(*mutable, Box::new(elem))
            }
            ExpKind::Opt(inner) => Type::Opt(Box::new(self.infer_exp(inner))),
            ExpKind::Dot(receiver, name) => {
                let receiver_ty = self.infer_exp(receiver);
                self.member(&receiver_ty, &name.node, name.span)
            }
            ExpKind::Proj(tuple, index) => {
                let tuple_ty = self.infer_exp(tuple);
                match tuple_ty.normalize() {
                    Type::Error => Type::Error,
                    Type::Tuple(items) if *index < items.len() => items[*index].clone(),
                    Type::Tuple(_) => {
                        self.error(
                            codes::FIELD_MISSING,
                            format!("tuple projection {index} is out of bounds for type\n  {tuple_ty}"),
                            exp.span,
                        );
                        Type::Error
                    }
                    _ => {
                        self.error(
                            codes::TYPE_MISMATCH,
                            format!("expected tuple type, but expression produces type\n  {tuple_ty}"),
                            tuple.span,
                        );
                        Type::Error
                    }
                }
            }
            ExpKind::Index(array, index) => {
                let array_ty = self.infer_exp(array);
                self.check_exp(index, &Type::NAT);
                match array_ty.normalize() {
                    Type::Error => Type::Error,
                    Type::Array(_, elem) => *elem,
                    _ => {
                        self.error(
                            codes::TYPE_MISMATCH,
                            format!("expected array type, but expression produces type\n  {array_ty}"),
                            array.span,
                        );
                        Type::Error
                    }
                }
            }
            ExpKind::Call { func, inst, arg } => self.infer_call(func, inst.as_deref(), arg),
            ExpKind::Block(decs) => {
                self.push_frame(!self.bodies.is_empty());
                let ty = self.check_decs(decs, None, false);
                self.pop_frame();
                ty
            }
            ExpKind::If(cond, then, els) => {
                self.check_exp(cond, &Type::BOOL);
                match els {
                    None => {
                        self.check_exp(then, &Type::unit());
                        Type::unit()
                    }
                    Some(els) => {
                        let then_ty = self.infer_exp(then);
                        let else_ty = self.infer_exp(els);
                        then_ty.lub(&else_ty)
                    }
                }
            }
            ExpKind::While(cond, body) => {
                self.check_exp(cond, &Type::BOOL);
                self.check_exp(body, &Type::unit());
                Type::unit()
            }
            ExpKind::Loop(body) => {
                self.check_exp(body, &Type::unit());
                Type::Non
            }
            ExpKind::For(pat, iter, body) => {
                let elem = self.iteration_type(iter);
                self.push_frame(!self.bodies.is_empty());
                self.bind_pat(pat, &elem);
                self.check_exp(body, &Type::unit());
                self.pop_frame();
                Type::unit()
            }
            ExpKind::Switch(scrutinee, cases) => {
                let scrutinee_ty = self.infer_exp(scrutinee);
                let mut result = Type::Non;
                for case in cases {
                    self.push_frame(!self.bodies.is_empty());
                    self.bind_pat(&case.pat, &scrutinee_ty);
                    let ty = self.infer_exp(&case.exp);
                    self.pop_frame();
                    result = result.lub(&ty);
                }
                result
            }
            ExpKind::Return(value) => {
                match self.body().map(|ctx| ctx.ret.clone()) {
                    None => {
                        self.error(codes::MISPLACED_RETURN, "misplaced return".into(), exp.span);
                        if let Some(value) = value {
                            self.infer_exp(value);
                        }
                    }
                    Some(ret) => match value {
                        Some(value) => {
                            self.check_exp(value, &ret);
                        }
                        None if !is_subtype(&Type::unit(), &ret) => self.mismatch(&Type::unit(), &ret, exp.span),
                        None => {}
                    },
                }
                Type::Non
            }
            ExpKind::Ignore(inner) => {
                self.infer_exp(inner);
                Type::unit()
            }
            ExpKind::Assert(cond) => {
                self.check_exp(cond, &Type::BOOL);
                Type::unit()
            }
            ExpKind::Async(body) => {
                self.bodies.push(BodyContext {
                    ret: Type::Error,
                    is_async: true,
                });
                let ty = self.infer_exp(body);
                self.bodies.pop();
                Type::Async(Box::new(ty))
            }
            ExpKind::Await(inner) => {
                if !self.body().is_some_and(|ctx| ctx.is_async) {
                    self.error(codes::MISPLACED_AWAIT, "misplaced await".into(), exp.span);
                }
                let ty = self.infer_exp(inner);
                match ty.normalize() {
                    Type::Async(result) => *result,
                    Type::Error => Type::Error,
                    _ => {
                        self.error(
                            codes::TYPE_MISMATCH,
                            format!("expected async type, but expression has type\n  {ty}"),
                            inner.span,
                        );
                        Type::Error
                    }
                }
            }
            ExpKind::Show(inner) => {
                self.infer_exp(inner);
                Type::TEXT
            }
            ExpKind::Func(func) => {
                let sig = self.func_signature(func, false);
                self.check_func_body(func, &sig);
                Type::func(sig)
            }
            ExpKind::Annot(inner, typ) => {
                let ty = self.resolve_typ(typ);
                self.check_exp(inner, &ty);
                ty
            }
            ExpKind::Error => Type::Error,
        }
    }

    fn check_async_body(&mut self, body: &Exp, result: &Type) {
        self.bodies.push(BodyContext {
            ret: result.clone(),
            is_async: true,
        });
        self.check_exp(body, result);
        self.bodies.pop();
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn infer_unary(&mut self, op: UnOp, operand: &Exp, span: Span) -> Type {
        if op == UnOp::Not {
            self.check_exp(operand, &Type::BOOL);
            return Type::BOOL;
        }
        let ty = self.infer_exp(operand);
        if ty.is_error() {
            return Type::Error;
        }
        if !ty.is_numeric() {
            self.error(
                codes::OPERATOR_UNDEFINED,
                format!("operator is not defined for operand type\n  {ty}"),
                span,
            );
            return Type::Error;
        }
        match (op, ty.as_prim()) {
            (UnOp::Neg, Some(PrimTypeId::Nat)) => Type::INT,
            _ => ty,
        }
    }

    /// Infer both operands, letting a numeric literal on either side take the other side's type.
    fn infer_operands(&mut self, lhs: &Exp, rhs: &Exp) -> (Type, Type) {
        if is_numeric_literal(lhs) && !is_numeric_literal(rhs) {
            let rt = self.infer_exp(rhs);
            let lt = if rt.is_numeric() { self.check_exp(lhs, &rt) } else { self.infer_exp(lhs) };
            return (lt, rt);
        }
        let lt = self.infer_exp(lhs);
        let rt = if lt.is_numeric() && is_numeric_literal(rhs) {
            self.check_exp(rhs, &lt)
        } else {
            self.infer_exp(rhs)
        };
        (lt, rt)
    }

    fn infer_binary(&mut self, lhs: &Exp, op: BinOp, rhs: &Exp, span: Span) -> Type {
        if op == BinOp::Cat {
            self.check_exp(lhs, &Type::TEXT);
            self.check_exp(rhs, &Type::TEXT);
            return Type::TEXT;
        }
        let (lt, rt) = self.infer_operands(lhs, rhs);
        if lt.is_error() || rt.is_error() {
            return Type::Error;
        }
        let joined = if is_subtype(&lt, &rt) {
            rt.clone()
        } else if is_subtype(&rt, &lt) {
            lt.clone()
        } else {
            Type::Any
        };
        if !operator_applies(op, &joined) {
            self.operator_undefined(&lt, &rt, span);
            return Type::Error;
        }
        if op == BinOp::Sub && joined.as_prim() == Some(PrimTypeId::Nat) {
            self.warn(
                codes::NAT_SUBTRACTION,
                "operator may trap for inferred type\n  Nat".into(),
                span,
            );
        }
        joined
    }

    fn operator_undefined(&mut self, lt: &Type, rt: &Type, span: Span) {
        self.error(
            codes::OPERATOR_UNDEFINED,
            format!("operator is not defined for operand types\n  {lt}\nand\n  {rt}"),
            span,
        );
    }

    /// Type of an assignment target; reports targets that are not mutable.
    fn assign_target(&mut self, target: &Exp) -> Type {
        let (ty, mutable) = match &target.kind {
            ExpKind::Var(name) => match self.lookup_value(name) {
                Some(binding) => (binding.ty, binding.mutable),
                None => {
                    self.error(codes::UNBOUND_VARIABLE, format!("unbound variable {name}"), target.span);
                    (Type::Error, true)
                }
            },
            ExpKind::Index(array, index) => {
                let array_ty = self.infer_exp(array);
                self.check_exp(index, &Type::NAT);
                match array_ty.normalize() {
                    Type::Array(mutable, elem) => (*elem, mutable),
                    _ => (Type::Error, array_ty.is_error()),
                }
            }
            ExpKind::Dot(receiver, name) => {
                let receiver_ty = self.infer_exp(receiver);
                match receiver_ty.field(&name.node) {
                    Some(field) => (field.ty, field.mutable),
                    None => (self.member(&receiver_ty, &name.node, name.span), receiver_ty.is_error()),
                }
            }
            ExpKind::Error => (Type::Error, true),
            _ => (self.infer_exp(target), false),
        };
        self.record(target.id, &ty);
        if !mutable {
            self.error(codes::NOT_MUTABLE, "expected mutable assignment target".into(), target.span);
            return Type::Error;
        }
        ty
    }

    // ========================================================================
    // Members, calls and contextual dot
    // ========================================================================

    /// Type of member `name` of a receiver of type `receiver_ty`.
    fn member(&mut self, receiver_ty: &Type, name: &str, span: Span) -> Type {
        if receiver_ty.is_error() {
            return Type::Error;
        }
        if let Some(field) = receiver_ty.field(name) {
            return field.ty;
        }
        if let Some(ty) = builtin_member(receiver_ty, name) {
            return ty;
        }
        self.error(
            codes::FIELD_MISSING,
            format!("field {name} does not exist in type\n  {receiver_ty}"),
            span,
        );
        Type::Error
    }

    fn infer_call(&mut self, func: &Exp, inst: Option<&[Typ]>, arg: &Exp) -> Type {
        let callee = match &func.kind {
            ExpKind::Dot(receiver, name) => {
                let receiver_ty = self.infer_exp(receiver);
                let ty = match receiver_ty.field(&name.node).map(|f| f.ty) {
                    Some(ty) => ty,
                    None => match builtin_member(&receiver_ty, &name.node) {
                        Some(ty) => ty,
                        None => match self.resolve_contextual_dot(func.id, &receiver_ty, &name.node) {
                            Some(ty) => ty,
                            None => self.member(&receiver_ty, &name.node, name.span),
                        },
                    },
                };
                self.record(func.id, &ty);
                ty
            }
            _ => self.infer_exp(func),
        };

        let Some(func_ty) = callee.as_func() else {
            if !callee.is_error() {
                self.error(
                    codes::NOT_A_FUNCTION,
                    format!("expected function type, but expression produces type\n  {callee}"),
                    func.span,
                );
            }
            self.infer_exp(arg);
            return Type::Error;
        };

        if func_ty.type_params.is_empty() {
            if let Some(inst) = inst {
                if !inst.is_empty() {
                    self.error(
                        codes::ARGUMENT_COUNT,
                        format!("function of type\n  {func_ty}\nexpects 0 type arguments, but {} were given", inst.len()),
                        func.span,
                    );
                }
            }
            self.check_args(arg, &func_ty.params);
            return func_ty.ret;
        }
        self.apply_generic(&func_ty, inst, arg, func.span)
    }

    /// Check call arguments against parameter types. A tuple argument spreads over several parameters.
    fn check_args(&mut self, arg: &Exp, params: &[Type]) {
        if params.len() == 1 {
            self.check_exp(arg, &params[0]);
            return;
        }
        let ExpKind::Tuple(elems) = &arg.kind else {
            self.check_exp(arg, &Type::Tuple(params.to_vec()));
            return;
        };
        if elems.len() != params.len() {
            self.error(
                codes::ARGUMENT_COUNT,
                format!("wrong number of arguments: expected {} but got {}", params.len(), elems.len()),
                arg.span,
            );
            self.infer_exp(arg);
            return;
        }
        for (elem, param) in elems.iter().zip(params) {
            self.check_exp(elem, param);
        }
        self.record(arg.id, &Type::Tuple(params.to_vec()));
    }

    /// Apply a generic function: instantiate explicitly or infer type arguments from the arguments.
    fn apply_generic(&mut self, func_ty: &FuncType, inst: Option<&[Typ]>, arg: &Exp, span: Span) -> Type {
        let arg_types: Vec<Type> = if func_ty.params.len() == 1 {
            vec![self.infer_exp(arg)]
        } else {
            match self.infer_exp(arg).normalize() {
                Type::Tuple(items) => items,
                other => vec![other],
            }
        };
        if arg_types.len() != func_ty.params.len() {
            self.error(
                codes::ARGUMENT_COUNT,
                format!(
                    "wrong number of arguments: expected {} but got {}",
                    func_ty.params.len(),
                    arg_types.len()
                ),
                arg.span,
            );
            return Type::Error;
        }

        let vars: Vec<String> = func_ty.type_params.iter().map(|p| p.name.clone()).collect();
        let mut inferred = HashMap::new();
        for (param, arg_ty) in func_ty.params.iter().zip(&arg_types) {
            infer_type_args(param, arg_ty, &vars, &mut inferred);
        }

        let chosen: Vec<Type> = match inst {
            Some(inst) => {
                let explicit: Vec<Type> = inst.iter().map(|t| self.resolve_typ(t)).collect();
                if explicit.len() != vars.len() {
                    self.error(
                        codes::ARGUMENT_COUNT,
                        format!(
                            "function of type\n  {func_ty}\nexpects {} type argument(s), but {} were given",
                            vars.len(),
                            explicit.len()
                        ),
                        span,
                    );
                    return Type::Error;
                }
                let redundant = vars
                    .iter()
                    .zip(&explicit)
                    .all(|(var, ty)| inferred.get(var).is_some_and(|found| equivalent(found, ty)));
                if redundant {
                    self.warn(
                        codes::REDUNDANT_INSTANTIATION,
                        "redundant type instantiation".into(),
                        span,
                    );
                }
                explicit
            }
            None => func_ty
                .type_params
                .iter()
                .map(|p| inferred.get(&p.name).cloned().unwrap_or(Type::Non))
                .collect(),
        };

        let applied = func_ty.instantiate(&chosen);
        let arg_exps: Vec<&Exp> = if applied.params.len() == 1 {
            vec![arg]
        } else {
            arg.call_args()
        };
        for ((param, arg_ty), arg_exp) in applied.params.iter().zip(&arg_types).zip(arg_exps) {
            if !is_subtype(arg_ty, param) {
                self.mismatch(arg_ty, param, arg_exp.span);
            }
        }
        applied.ret
    }

    /// Resolve `receiver.name(..)` against the public functions of imported modules whose first parameter accepts
    /// the receiver. Records the binding and returns the type of the remaining call.
    fn resolve_contextual_dot(&mut self, dot_id: ExpId, receiver_ty: &Type, name: &str) -> Option<Type> {
        if receiver_ty.is_error() {
            return None;
        }
        let mut candidates: Vec<(String, Option<String>, FuncType)> = self
            .imported
            .iter()
            .filter_map(|module| {
                let sig = module.scope.function(name)?;
                let rest = receiver_application(&sig.func, receiver_ty)?;
                Some((module.uri.clone(), module.alias.clone(), rest))
            })
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0));
        let (uri, alias, rest) = candidates.into_iter().next()?;
        tracing::debug!(uri = %uri, func = name, "resolved contextual dot");
        self.dot_bindings.insert(
            dot_id,
            DotBinding {
                module_alias: alias,
                module_uri: uri,
                func_name: name.to_string(),
            },
        );
        Some(Type::func(rest))
    }

    // ========================================================================
    // Iteration and patterns
    // ========================================================================

    fn iteration_type(&mut self, iter: &Exp) -> Type {
        let ty = self.infer_exp(iter);
        if ty.is_error() {
            return Type::Error;
        }
        let next = ty.field("next").and_then(|f| f.ty.as_func());
        match next.map(|f| f.ret.normalize()) {
            Some(Type::Opt(elem)) => *elem,
            _ => {
                self.error(
                    codes::TYPE_MISMATCH,
                    format!("expected iterable type, but expression has type\n  {ty}"),
                    iter.span,
                );
                Type::Error
            }
        }
    }

    /// Bind the variables of `pat`, matched against a value of type `ty`.
    pub(crate) fn bind_pat(&mut self, pat: &Pat, ty: &Type) {
        match &pat.kind {
            PatKind::Wild | PatKind::Error => {}
            PatKind::Var(name) => self.bind_value(name, ty.clone(), false, pat.span),
            PatKind::Lit(lit) => {
                let fits = match (lit, ty.as_prim()) {
                    (Lit::Nat(digits), Some(id)) => nat_literal_fit(digits, false, id) == LiteralFit::Fits,
                    (Lit::Null, _) => matches!(ty.normalize(), Type::Opt(_)) || is_subtype(&Type::NULL, ty),
                    _ => is_subtype(&lit_type(lit), ty),
                };
                if !fits && !ty.is_error() {
                    self.mismatch(&lit_type(lit), ty, pat.span);
                }
            }
            PatKind::Tuple(pats) => match ty.normalize() {
                Type::Tuple(items) if items.len() == pats.len() => {
                    for (p, item) in pats.iter().zip(&items) {
                        self.bind_pat(p, item);
                    }
                }
                other => {
                    if !other.is_error() {
                        self.error(
                            codes::TYPE_MISMATCH,
                            format!("tuple pattern cannot consume expected type\n  {ty}"),
                            pat.span,
                        );
                    }
                    pats.iter().for_each(|p| self.bind_pat(p, &Type::Error));
                }
            },
            PatKind::Opt(inner) => match ty.normalize() {
                Type::Opt(elem) => self.bind_pat(inner, &elem),
                other => {
                    if !other.is_error() {
                        self.error(
                            codes::TYPE_MISMATCH,
                            format!("option pattern cannot consume expected type\n  {ty}"),
                            pat.span,
                        );
                    }
                    self.bind_pat(inner, &Type::Error);
                }
            },
            PatKind::Annot(inner, typ) => {
                let annotated = self.resolve_typ(typ);
                if !is_subtype(ty, &annotated) {
                    self.mismatch(ty, &annotated, pat.span);
                }
                self.bind_pat(inner, &annotated);
            }
        }
    }
}

/// `func` applied to a receiver as its first argument: the function over the remaining parameters, or `None` when
/// the first parameter does not accept the receiver.
pub(crate) fn receiver_application(func: &FuncType, receiver_ty: &Type) -> Option<FuncType> {
    let first = func.params.first()?;
    let func = if func.type_params.is_empty() {
        func.clone()
    } else {
        let vars: Vec<String> = func.type_params.iter().map(|p| p.name.clone()).collect();
        let mut inferred = HashMap::new();
        infer_type_args(first, receiver_ty, &vars, &mut inferred);
        let map: HashMap<String, Type> = inferred;
        let remaining = func
            .type_params
            .iter()
            .filter(|p| !map.contains_key(&p.name))
            .cloned()
            .collect();
        FuncType {
            sort: func.sort,
            type_params: remaining,
            params: func.params.iter().map(|t| t.subst(&map)).collect(),
            param_names: func.param_names.clone(),
            ret: func.ret.subst(&map),
        }
    };
    if !is_subtype(receiver_ty, &func.params[0]) {
        return None;
    }
    Some(FuncType {
        sort: func.sort,
        type_params: func.type_params,
        params: func.params[1..].to_vec(),
        param_names: func.param_names.get(1..).map(<[_]>::to_vec).unwrap_or_default(),
        ret: func.ret,
    })
}

fn is_numeric_literal(exp: &Exp) -> bool {
    match &exp.kind {
        ExpKind::Lit(Lit::Nat(_) | Lit::Float(_)) => true,
        ExpKind::Unary(UnOp::Neg, inner) => is_numeric_literal(inner),
        _ => false,
    }
}

fn operator_applies(op: BinOp, ty: &Type) -> bool {
    match op {
        BinOp::Cat => ty.as_prim() == Some(PrimTypeId::Text),
        _ => ty.is_numeric(),
    }
}

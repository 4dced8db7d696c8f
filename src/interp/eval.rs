//! Tree-walking evaluation of checked units.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use motoko_core::lang::prims::PrimTypeId;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use motoko_syntax::ast::*;

use super::value::{self, Builtin, Callable, Env, Object, PrimFn, Scope, Value};
use crate::frontend::resolver::{ImportKey, ResolvedUnit};
use crate::frontend::scope::PRIM_URI;
use crate::frontend::semantic::TypeCheckInfo;
use crate::frontend::types::Type;

/// A runtime fault, located in the unit being evaluated.
#[derive(Debug, Clone)]
pub(crate) struct Fault {
    pub message: String,
    pub span: Span,
    pub unit: usize,
}

/// Non-local exits.
pub(crate) enum Flow<'p> {
    Return(Value<'p>),
    Fault(Fault),
}

type Eval<'p> = Result<Value<'p>, Flow<'p>>;

/// Largest power, in bits, `**` computes before reporting an overflow.
const MAX_POW_BITS: u64 = 1 << 24;

pub(crate) struct Interpreter<'p> {
    units: &'p [ResolvedUnit],
    /// Values of evaluated units, by path.
    modules: HashMap<&'p str, Value<'p>>,
    /// Unit whose code is running.
    unit: usize,
    pub stdout: String,
    actors: u64,
}

impl<'p> Interpreter<'p> {
    pub fn new(units: &'p [ResolvedUnit]) -> Self {
        Self {
            units,
            modules: HashMap::new(),
            unit: 0,
            stdout: String::new(),
            actors: 0,
        }
    }

    /// Evaluate one unit; its imports must already be evaluated.
    pub fn run_unit(&mut self, index: usize) -> Result<Value<'p>, Fault> {
        let units = self.units;
        let unit = &units[index];
        self.unit = index;
        let env = Scope::root();
        let value = match self.eval_decs(&unit.program.decs, &env) {
            Ok(value) | Err(Flow::Return(value)) => value,
            Err(Flow::Fault(fault)) => return Err(fault),
        };
        self.modules.insert(unit.path.as_str(), value.clone());
        Ok(value)
    }

    fn info(&self) -> &'p TypeCheckInfo {
        let units = self.units;
        &units[self.unit].info
    }

    fn exp_type(&self, id: ExpId) -> Option<&'p Type> {
        self.info().exp_type(id)
    }

    fn fault(&self, span: Span, message: impl Into<String>) -> Flow<'p> {
        Flow::Fault(Fault {
            message: message.into(),
            span,
            unit: self.unit,
        })
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Evaluate a declaration list; its value is the value of the last declaration.
    fn eval_decs(&mut self, decs: &'p [DecField], env: &Env<'p>) -> Eval<'p> {
        for field in decs {
            match &field.dec.node {
                Dec::Func(dec) => {
                    let closure = Callable::Closure {
                        func: &dec.func,
                        env: env.clone(),
                        unit: self.unit,
                    };
                    env.define(&dec.name.node, Value::Func(Rc::new(closure)));
                }
                Dec::Class(dec) => {
                    let class = Callable::Class {
                        dec,
                        env: env.clone(),
                        unit: self.unit,
                    };
                    env.define(&dec.name.node, Value::Func(Rc::new(class)));
                }
                _ => {}
            }
        }
        let mut last = Value::unit();
        for field in decs {
            last = self.eval_dec(field, env)?;
        }
        Ok(last)
    }

    fn eval_dec(&mut self, field: &'p DecField, env: &Env<'p>) -> Eval<'p> {
        let span = field.dec.span;
        match &field.dec.node {
            Dec::Exp(exp) => self.eval(exp, env),
            Dec::Let(dec) => {
                let value = self.eval(&dec.exp, env)?;
                if !bind_pat(&dec.pat, &value, env) {
                    return Err(self.fault(span, "value does not match pattern"));
                }
                Ok(value)
            }
            Dec::Var(dec) => {
                let value = self.eval(&dec.exp, env)?;
                env.define(&dec.name.node, value);
                Ok(Value::unit())
            }
            Dec::Module(dec) => {
                let module = self.eval_object(ObjSort::Module, &dec.fields, env)?;
                if let Some(name) = &dec.name {
                    env.define(&name.node, module.clone());
                }
                Ok(module)
            }
            Dec::Object(dec) => {
                let object = self.eval_object(dec.sort, &dec.fields, env)?;
                if let Some(name) = &dec.name {
                    env.define(&name.node, object.clone());
                }
                Ok(object)
            }
            Dec::Import(import) => {
                let module = self.import(import, span)?;
                env.define(&import.name.node, module);
                Ok(Value::unit())
            }
            Dec::Type(_) | Dec::Func(_) | Dec::Class(_) => Ok(Value::unit()),
            Dec::Error => Err(self.fault(span, "malformed declaration")),
        }
    }

    /// Evaluate an object body and expose its public fields.
    fn eval_object(&mut self, sort: ObjSort, fields: &'p [DecField], env: &Env<'p>) -> Eval<'p> {
        let inner = Scope::child(env);
        self.eval_decs(fields, &inner)?;
        let mut public = BTreeMap::new();
        for field in fields.iter().filter(|f| f.is_public()) {
            for name in declared_names(&field.dec.node) {
                if let Some(cell) = inner.local(name) {
                    public.insert(name.to_string(), cell);
                }
            }
        }
        let object = Rc::new(Object { sort, fields: public });
        if sort == ObjSort::Actor {
            self.actors += 1;
            tracing::debug!(id = self.actors, "created actor");
            return Ok(Value::Actor {
                id: self.actors,
                object,
            });
        }
        Ok(Value::Object(object))
    }

    fn import(&self, import: &ImportDec, span: Span) -> Eval<'p> {
        let units = self.units;
        let key = units[self.unit]
            .imports
            .iter()
            .find(|i| i.written == import.path.node)
            .map(|i| &i.key);
        match key {
            Some(ImportKey::Unit(path)) => self
                .modules
                .get(path.as_str())
                .cloned()
                .ok_or_else(|| self.fault(span, format!("module {path} was not evaluated"))),
            Some(ImportKey::Prim) => Ok(value::prim_module()),
            Some(ImportKey::Blob) => Err(self.fault(span, "blob import placeholder")),
            Some(ImportKey::Failed) | None => Err(self.fault(span, "unresolved import")),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn eval(&mut self, exp: &'p Exp, env: &Env<'p>) -> Eval<'p> {
        match &exp.kind {
            ExpKind::Lit(lit) => self.literal(exp, lit),
            ExpKind::Var(name) => env
                .lookup(name)
                .map(|cell| cell.borrow().clone())
                .ok_or_else(|| self.fault(exp.span, format!("unbound variable {name}"))),
            ExpKind::Unary(op, operand) => {
                let value = self.eval(operand, env)?;
                match (op, value) {
                    (UnOp::Neg, Value::Int(n)) => {
                        let prim = self.exp_type(exp.id).and_then(Type::as_prim);
                        self.checked(exp, prim, Some(-n))
                    }
                    (UnOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
                    (UnOp::Pos, value) => Ok(value),
                    (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    _ => Err(self.fault(exp.span, "operator not defined for operand")),
                }
            }
            ExpKind::Binary(lhs, op, rhs) => {
                let a = self.eval(lhs, env)?;
                let b = self.eval(rhs, env)?;
                let prim = self.exp_type(exp.id).and_then(Type::as_prim);
                self.arith(exp, prim, *op, a, b)
            }
            ExpKind::Compare(lhs, op, rhs) => {
                let a = self.eval(lhs, env)?;
                let b = self.eval(rhs, env)?;
                let result = match op {
                    RelOp::Eq => value::equal(&a, &b),
                    RelOp::Neq => !value::equal(&a, &b),
                    _ => {
                        let Some(ord) = ordering(&a, &b) else {
                            return Err(self.fault(exp.span, "values are not comparable"));
                        };
                        match op {
                            RelOp::Lt => ord == Ordering::Less,
                            RelOp::Le => ord != Ordering::Greater,
                            RelOp::Gt => ord == Ordering::Greater,
                            _ => ord != Ordering::Less,
                        }
                    }
                };
                Ok(Value::Bool(result))
            }
            ExpKind::And(lhs, rhs) => match self.eval(lhs, env)? {
                Value::Bool(false) => Ok(Value::Bool(false)),
                _ => self.eval(rhs, env),
            },
            ExpKind::Or(lhs, rhs) => match self.eval(lhs, env)? {
                Value::Bool(true) => Ok(Value::Bool(true)),
                _ => self.eval(rhs, env),
            },
            ExpKind::Assign(target, rhs) => {
                let value = self.eval(rhs, env)?;
                self.assign(target, value, env)?;
                Ok(Value::unit())
            }
            ExpKind::OpAssign(target, op, rhs) => {
                let current = self.eval(target, env)?;
                let operand = self.eval(rhs, env)?;
                let prim = self.exp_type(target.id).and_then(Type::as_prim);
                let value = self.arith(exp, prim, *op, current, operand)?;
                self.assign(target, value, env)?;
                Ok(Value::unit())
            }
            ExpKind::Tuple(elems) => {
                let items = self.eval_all(elems.iter(), env)?;
                Ok(Value::Tuple(Rc::from(items)))
            }
            ExpKind::Record(fields) => {
                let mut cells = BTreeMap::new();
                for field in fields {
                    let value = self.eval(&field.exp, env)?;
                    cells.insert(field.name.node.clone(), Rc::new(RefCell::new(value)));
                }
                Ok(Value::Object(Rc::new(Object {
                    sort: ObjSort::Object,
                    fields: cells,
                })))
            }
            ExpKind::Array { elems, .. } => {
                let items = self.eval_all(elems.iter(), env)?;
                Ok(Value::Array(Rc::new(RefCell::new(items))))
            }
            ExpKind::Opt(inner) => Ok(Value::Opt(Box::new(self.eval(inner, env)?))),
            ExpKind::Dot(receiver, member) => {
                let value = self.eval(receiver, env)?;
                self.member(exp, value, &member.node)
            }
            ExpKind::Proj(tuple, index) => match self.eval(tuple, env)? {
                Value::Tuple(items) if *index < items.len() => Ok(items[*index].clone()),
                _ => Err(self.fault(exp.span, "tuple projection out of range")),
            },
            ExpKind::Index(array, index) => {
                let array = self.eval(array, env)?;
                let index = self.eval(index, env)?;
                match (array, index) {
                    (Value::Array(items), Value::Int(i)) => i
                        .to_usize()
                        .and_then(|i| items.borrow().get(i).cloned())
                        .ok_or_else(|| self.fault(exp.span, "index out of bounds")),
                    _ => Err(self.fault(exp.span, "value is not indexable")),
                }
            }
            ExpKind::Call { func, arg, .. } => self.call(exp, func, arg, env),
            ExpKind::Block(decs) => {
                let inner = Scope::child(env);
                self.eval_decs(decs, &inner)
            }
            ExpKind::If(cond, then, els) => {
                if self.condition(cond, env)? {
                    self.eval(then, env)
                } else {
                    match els {
                        Some(els) => self.eval(els, env),
                        None => Ok(Value::unit()),
                    }
                }
            }
            ExpKind::While(cond, body) => {
                while self.condition(cond, env)? {
                    self.eval(body, env)?;
                }
                Ok(Value::unit())
            }
            ExpKind::Loop(body) => loop {
                self.eval(body, env)?;
            },
            ExpKind::For(pat, iter, body) => {
                let iter = self.eval(iter, env)?;
                let Some(next) = iter.object().and_then(|o| o.field("next")) else {
                    return Err(self.fault(exp.span, "value is not an iterator"));
                };
                loop {
                    match self.call_value(exp, &next, Vec::new())? {
                        Value::Opt(item) => {
                            let inner = Scope::child(env);
                            if !bind_pat(pat, &item, &inner) {
                                return Err(self.fault(pat.span, "value does not match pattern"));
                            }
                            self.eval(body, &inner)?;
                        }
                        _ => break,
                    }
                }
                Ok(Value::unit())
            }
            ExpKind::Switch(scrutinee, cases) => {
                let value = self.eval(scrutinee, env)?;
                for case in cases {
                    let inner = Scope::child(env);
                    if bind_pat(&case.pat, &value, &inner) {
                        return self.eval(&case.exp, &inner);
                    }
                }
                Err(self.fault(exp.span, "switch fell through"))
            }
            ExpKind::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(value, env)?,
                    None => Value::unit(),
                };
                Err(Flow::Return(value))
            }
            ExpKind::Ignore(inner) => {
                self.eval(inner, env)?;
                Ok(Value::unit())
            }
            ExpKind::Assert(cond) => {
                if self.condition(cond, env)? {
                    Ok(Value::unit())
                } else {
                    Err(self.fault(exp.span, "assertion failure"))
                }
            }
            ExpKind::Async(inner) => Ok(Value::Future(Box::new(self.eval(inner, env)?))),
            ExpKind::Await(inner) => match self.eval(inner, env)? {
                Value::Future(value) => Ok(*value),
                value => Ok(value),
            },
            ExpKind::Show(inner) => {
                let value = self.eval(inner, env)?;
                let ty = self.exp_type(inner.id).cloned().unwrap_or(Type::Any);
                Ok(Value::text(&value::show(&value, &ty)))
            }
            ExpKind::Func(func) => Ok(Value::Func(Rc::new(Callable::Closure {
                func,
                env: env.clone(),
                unit: self.unit,
            }))),
            ExpKind::Annot(inner, _) => self.eval(inner, env),
            ExpKind::Error => Err(self.fault(exp.span, "malformed expression")),
        }
    }

    fn eval_all(&mut self, exps: impl Iterator<Item = &'p Exp>, env: &Env<'p>) -> Result<Vec<Value<'p>>, Flow<'p>> {
        exps.map(|exp| self.eval(exp, env)).collect()
    }

    fn condition(&mut self, cond: &'p Exp, env: &Env<'p>) -> Result<bool, Flow<'p>> {
        match self.eval(cond, env)? {
            Value::Bool(b) => Ok(b),
            _ => Err(self.fault(cond.span, "condition is not a Bool")),
        }
    }

    fn literal(&self, exp: &Exp, lit: &'p Lit) -> Eval<'p> {
        Ok(match lit {
            Lit::Nat(digits) => match self.exp_type(exp.id).and_then(Type::as_prim) {
                Some(PrimTypeId::Float) => match digits.parse::<f64>() {
                    Ok(f) => Value::Float(f),
                    Err(_) => return Err(self.fault(exp.span, "malformed number literal")),
                },
                _ => match digits.parse::<BigInt>() {
                    Ok(n) => Value::Int(n),
                    Err(_) => return Err(self.fault(exp.span, "malformed number literal")),
                },
            },
            Lit::Float(digits) => match digits.parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => return Err(self.fault(exp.span, "malformed float literal")),
            },
            Lit::Text(text) => Value::Text(Rc::from(&**text)),
            Lit::Char(c) => Value::Char(*c),
            Lit::Bool(b) => Value::Bool(*b),
            Lit::Null => Value::Null,
        })
    }

    fn checked(&self, at: &Exp, prim: Option<PrimTypeId>, result: Option<BigInt>) -> Eval<'p> {
        result
            .filter(|n| prim.is_none_or(|p| value::in_range(n, p)))
            .map(Value::Int)
            .ok_or_else(|| self.fault(at.span, "arithmetic overflow"))
    }

    fn arith(&self, at: &Exp, prim: Option<PrimTypeId>, op: BinOp, a: Value<'p>, b: Value<'p>) -> Eval<'p> {
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => {
                if matches!(op, BinOp::Div | BinOp::Mod) && y.is_zero() {
                    return Err(self.fault(at.span, "division by zero"));
                }
                let result = match op {
                    BinOp::Add => Some(x + y),
                    BinOp::Sub => Some(x - y),
                    BinOp::Mul => Some(x * y),
                    BinOp::Div => Some(x / y),
                    BinOp::Mod => Some(x % y),
                    BinOp::Pow => y
                        .to_u32()
                        .filter(|e| x.bits().saturating_mul(u64::from(*e)) <= MAX_POW_BITS)
                        .map(|e| x.pow(e)),
                    BinOp::Cat => return Err(self.fault(at.span, "operator not defined for numbers")),
                };
                self.checked(at, prim, result)
            }
            (Value::Float(x), Value::Float(y)) => Ok(Value::Float(match op {
                BinOp::Add => x + y,
                BinOp::Sub => x - y,
                BinOp::Mul => x * y,
                BinOp::Div => x / y,
                BinOp::Mod => x % y,
                BinOp::Pow => x.powf(y),
                BinOp::Cat => return Err(self.fault(at.span, "operator not defined for numbers")),
            })),
            (Value::Text(x), Value::Text(y)) if op == BinOp::Cat => Ok(Value::text(&format!("{x}{y}"))),
            _ => Err(self.fault(at.span, "operator not defined for operands")),
        }
    }

    fn assign(&mut self, target: &'p Exp, value: Value<'p>, env: &Env<'p>) -> Result<(), Flow<'p>> {
        match &target.kind {
            ExpKind::Var(name) => match env.lookup(name) {
                Some(cell) => {
                    *cell.borrow_mut() = value;
                    Ok(())
                }
                None => Err(self.fault(target.span, format!("unbound variable {name}"))),
            },
            ExpKind::Dot(object, member) => {
                let object = self.eval(object, env)?;
                match object.object().and_then(|o| o.fields.get(&member.node)) {
                    Some(cell) => {
                        *cell.borrow_mut() = value;
                        Ok(())
                    }
                    None => Err(self.fault(target.span, format!("field {} does not exist", member.node))),
                }
            }
            ExpKind::Index(array, index) => {
                let array = self.eval(array, env)?;
                let index = self.eval(index, env)?;
                if let (Value::Array(items), Value::Int(i)) = (array, index) {
                    if let Some(slot) = i.to_usize().and_then(|i| {
                        let len = items.borrow().len();
                        (i < len).then_some(i)
                    }) {
                        items.borrow_mut()[slot] = value;
                        return Ok(());
                    }
                }
                Err(self.fault(target.span, "index out of bounds"))
            }
            _ => Err(self.fault(target.span, "expression is not assignable")),
        }
    }

    fn member(&self, at: &Exp, receiver: Value<'p>, name: &str) -> Eval<'p> {
        if let Some(object) = receiver.object() {
            return object
                .field(name)
                .ok_or_else(|| self.fault(at.span, format!("field {name} does not exist")));
        }
        match Builtin::lookup(&receiver, name) {
            Some(builtin) => Ok(Value::Func(Rc::new(Callable::Builtin(builtin, receiver)))),
            None => Err(self.fault(at.span, format!("field {name} does not exist"))),
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn call(&mut self, exp: &'p Exp, func: &'p Exp, arg: &'p Exp, env: &Env<'p>) -> Eval<'p> {
        if let ExpKind::Dot(receiver, _) = &func.kind {
            if let Some(binding) = self.info().dot_binding(func.id) {
                let receiver = self.eval(receiver, env)?;
                let module = if binding.module_uri == PRIM_URI {
                    Some(value::prim_module())
                } else {
                    self.modules.get(binding.module_uri.as_str()).cloned()
                };
                let Some(callee) = module.as_ref().and_then(Value::object).and_then(|m| m.field(&binding.func_name))
                else {
                    return Err(self.fault(func.span, format!("function {} is not available", binding.func_name)));
                };
                let mut args = vec![receiver];
                args.extend(self.eval_all(arg.call_args().into_iter(), env)?);
                return self.call_value(exp, &callee, args);
            }
        }
        let callee = self.eval(func, env)?;
        let args = self.eval_all(arg.call_args().into_iter(), env)?;
        self.call_value(exp, &callee, args)
    }

    fn call_value(&mut self, at: &'p Exp, callee: &Value<'p>, args: Vec<Value<'p>>) -> Eval<'p> {
        let Value::Func(callable) = callee else {
            return Err(self.fault(at.span, "value is not a function"));
        };
        match &**callable {
            Callable::Closure { func, env, unit } => {
                let func: &'p FuncLit = *func;
                let inner = Scope::child(env);
                bind_params(&func.params, adapt_args(func.params.len(), args), &inner);
                let saved = std::mem::replace(&mut self.unit, *unit);
                let result = self.eval(&func.body, &inner);
                self.unit = saved;
                let value = match result {
                    Ok(value) | Err(Flow::Return(value)) => value,
                    Err(fault) => return Err(fault),
                };
                if returns_async(func) && !matches!(func.body.kind, ExpKind::Async(_)) {
                    return Ok(Value::Future(Box::new(value)));
                }
                Ok(value)
            }
            Callable::Class { dec, env, unit } => {
                let dec: &'p ClassDec = *dec;
                let inner = Scope::child(env);
                bind_params(&dec.params, adapt_args(dec.params.len(), args), &inner);
                let saved = std::mem::replace(&mut self.unit, *unit);
                let result = self.eval_object(dec.sort, &dec.fields, &inner);
                self.unit = saved;
                let instance = result?;
                if dec.sort == ObjSort::Actor {
                    return Ok(Value::Future(Box::new(instance)));
                }
                Ok(instance)
            }
            Callable::Prim(prim) => self.prim(at, *prim, args),
            Callable::Builtin(builtin, receiver) => self.builtin(at, *builtin, receiver),
            Callable::Next(items) => Ok(match items.borrow_mut().next() {
                Some(item) => Value::Opt(Box::new(item)),
                None => Value::Null,
            }),
        }
    }

    fn prim(&mut self, at: &Exp, prim: PrimFn, args: Vec<Value<'p>>) -> Eval<'p> {
        match (prim, args.into_iter().next()) {
            (PrimFn::DebugPrint, Some(Value::Text(text))) => {
                self.stdout.push_str(&text);
                self.stdout.push('\n');
                Ok(Value::unit())
            }
            (PrimFn::NatToText | PrimFn::IntToText, Some(Value::Int(n))) => Ok(Value::text(&n.to_string())),
            (PrimFn::TextSize, Some(Value::Text(text))) => Ok(Value::int(text.chars().count())),
            (PrimFn::Trap, Some(Value::Text(text))) => Err(self.fault(at.span, format!("explicit trap: {text}"))),
            (prim, _) => Err(self.fault(at.span, format!("bad arguments to {}", prim.name()))),
        }
    }

    fn builtin(&self, at: &Exp, builtin: Builtin, receiver: &Value<'p>) -> Eval<'p> {
        Ok(match (builtin, receiver) {
            (Builtin::Size, Value::Text(text)) => Value::int(text.chars().count()),
            (Builtin::Size, Value::Blob(bytes)) => Value::int(bytes.len()),
            (Builtin::Size, Value::Array(items)) => Value::int(items.borrow().len()),
            (Builtin::Chars, Value::Text(text)) => value::iterator(text.chars().map(Value::Char).collect()),
            (Builtin::Vals, Value::Array(items)) => value::iterator(items.borrow().clone()),
            (Builtin::Keys, Value::Array(items)) => {
                value::iterator((0..items.borrow().len()).map(Value::int).collect())
            }
            _ => return Err(self.fault(at.span, "member not defined for value")),
        })
    }
}

/// Names a declaration binds in its enclosing scope.
fn declared_names(dec: &Dec) -> Vec<&str> {
    match dec {
        Dec::Let(dec) => dec.pat.bound_names(),
        Dec::Var(dec) => vec![dec.name.node.as_str()],
        Dec::Func(dec) => vec![dec.name.node.as_str()],
        Dec::Class(dec) => vec![dec.name.node.as_str()],
        Dec::Module(dec) => dec.name.iter().map(|n| n.node.as_str()).collect(),
        Dec::Object(dec) => dec.name.iter().map(|n| n.node.as_str()).collect(),
        Dec::Exp(_) | Dec::Type(_) | Dec::Import(_) | Dec::Error => Vec::new(),
    }
}

fn returns_async(func: &FuncLit) -> bool {
    matches!(func.ret.as_ref().map(|t| &t.kind), Some(TypKind::Async(_)))
}

/// Match a call's arguments to `arity` parameters: a single tuple spreads, several values pack into one.
fn adapt_args(arity: usize, args: Vec<Value<'_>>) -> Vec<Value<'_>> {
    if args.len() == arity {
        return args;
    }
    if arity == 1 {
        return vec![Value::Tuple(Rc::from(args))];
    }
    match args.as_slice() {
        [Value::Tuple(items)] if items.len() == arity => items.to_vec(),
        _ => args,
    }
}

fn bind_params<'p>(params: &[Param], args: Vec<Value<'p>>, env: &Env<'p>) {
    for (param, arg) in params.iter().zip(args) {
        if param.name.node != "_" {
            env.define(&param.name.node, arg);
        }
    }
}

/// Match `value` against `pat`, binding its variables in `env`.
fn bind_pat<'p>(pat: &Pat, value: &Value<'p>, env: &Env<'p>) -> bool {
    match (&pat.kind, value) {
        (PatKind::Wild, _) => true,
        (PatKind::Var(name), value) => {
            env.define(name, value.clone());
            true
        }
        (PatKind::Lit(lit), value) => literal_matches(lit, value),
        (PatKind::Tuple(pats), Value::Tuple(items)) => {
            pats.len() == items.len() && pats.iter().zip(items.iter()).all(|(p, v)| bind_pat(p, v, env))
        }
        (PatKind::Opt(inner), Value::Opt(value)) => bind_pat(inner, value, env),
        (PatKind::Annot(inner, _), value) => bind_pat(inner, value, env),
        _ => false,
    }
}

fn literal_matches(lit: &Lit, value: &Value<'_>) -> bool {
    match (lit, value) {
        (Lit::Nat(digits), Value::Int(n)) => digits.parse::<BigInt>().is_ok_and(|d| d == *n),
        (Lit::Nat(digits), Value::Float(f)) => digits.parse::<f64>().is_ok_and(|d| d == *f),
        (Lit::Float(digits), Value::Float(f)) => digits.parse::<f64>().is_ok_and(|d| d == *f),
        (Lit::Text(text), Value::Text(t)) => **text == **t,
        (Lit::Char(c), Value::Char(v)) => c == v,
        (Lit::Bool(b), Value::Bool(v)) => b == v,
        (Lit::Null, Value::Null) => true,
        _ => false,
    }
}

fn ordering(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Char(x), Value::Char(y)) => Some(x.cmp(y)),
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        (Value::Blob(x), Value::Blob(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

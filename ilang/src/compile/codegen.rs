use std::{collections::HashMap, convert::TryFrom, mem};

use indexmap::IndexMap;
use log::{debug, trace, warn};

use super::{
    descriptor::{Descriptor, Kind, MethodDescriptor},
    ir::{ArithOp, Cond, Instr, InvokeKind, Label, LogicOp},
    symbol::{RecordTable, SymbolTable},
    unit::{Field, Method, Unit, OBJECT_CLASS},
    GenConf,
};
use crate::{
    ast::{
        ArrayDecl, Assign, BinOp, Binary, Call, Expr, For, If, LValue, Literal, Name, Program, RecordDecl,
        RoutineDecl, Selector, Stmt, TypeRef, UnOp, Unary, VarDecl, While,
    },
    error::{IlangError, IlangResult},
};

const STRING_CLASS: &str = "java/lang/String";
const PRINT_STREAM: &str = "java/io/PrintStream";

/// Code generator.
///
/// Lowers a checked program into the primary unit, holding the entry
/// point and one static method per routine, followed by one unit per
/// record type. The generator is consumed by [`CodeGen::generate`], so
/// every run starts from empty tables.
pub struct CodeGen {
    conf: GenConf,
    /// Method currently being lowered.
    frame: Frame,
    records: RecordTable,
    /// Call descriptors of routines whose code has been generated.
    routines: HashMap<Name, MethodDescriptor>,
    /// Routine methods of the primary unit, in declaration order.
    methods: Vec<Method>,
    record_units: Vec<Unit>,
    next_label: u32,
}

/// Slot frame and code buffer of one method.
struct Frame {
    /// Enclosing routine, `None` for the entry point.
    routine: Option<Name>,
    ret: Option<Descriptor>,
    symbols: SymbolTable,
    code: Vec<Instr>,
}

impl Frame {
    /// The entry point keeps slot 0 for its argument array.
    fn entry() -> Self {
        Self {
            routine: None,
            ret: None,
            symbols: SymbolTable::starting_at(1),
            code: vec![],
        }
    }

    fn routine(name: Name, ret: Option<Descriptor>) -> Self {
        Self {
            routine: Some(name),
            ret,
            symbols: SymbolTable::starting_at(0),
            code: vec![],
        }
    }
}

impl CodeGen {
    pub fn new(conf: GenConf) -> Self {
        Self {
            conf,
            frame: Frame::entry(),
            records: RecordTable::default(),
            routines: HashMap::new(),
            methods: vec![],
            record_units: vec![],
            next_label: 0,
        }
    }

    /// Generates every unit of the program, primary unit first.
    pub fn generate(mut self, program: &Program) -> IlangResult<Vec<Unit>> {
        self.block(&program.stmts)?;
        self.emit(Instr::Return(None));

        let frame = mem::replace(&mut self.frame, Frame::entry());
        let main = Method::new(
            "main",
            MethodDescriptor::new(vec![Descriptor::array(Descriptor::Str)], None),
            true,
            frame.symbols.slot_count(),
            frame.code,
        );

        let mut primary = Unit::new(self.conf.main_class.clone());
        primary.methods.push(main);
        primary.methods.append(&mut self.methods);
        debug!(
            "generated unit {} with {} method(s), {} record unit(s)",
            primary.name,
            primary.methods.len(),
            self.record_units.len()
        );

        let mut units = vec![primary];
        units.append(&mut self.record_units);
        Ok(units)
    }

    #[inline]
    fn emit(&mut self, instr: Instr) {
        self.frame.code.push(instr);
    }

    fn label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Call descriptor registered for a routine.
    fn routine_desc(&self, name: &Name) -> IlangResult<&MethodDescriptor> {
        self.routines
            .get(name)
            .ok_or_else(|| IlangError::UnregisteredRoutine(name.clone()))
    }

    /// Descriptor and array length for a type reference.
    fn resolve(&self, ty: &TypeRef) -> IlangResult<(Descriptor, Option<u32>)> {
        match ty {
            TypeRef::Named(name) => {
                if let Some(desc) = Descriptor::builtin(name) {
                    Ok((desc, None))
                } else if self.records.contains(name) {
                    Ok((Descriptor::Object(name.clone()), None))
                } else {
                    Err(IlangError::unsupported(format!("unknown type '{name}'")))
                }
            }
            TypeRef::Array { elem, size } => {
                let elem = Descriptor::array_elem(elem)
                    .ok_or_else(|| IlangError::unsupported(format!("array of '{elem}'")))?;
                Ok((Descriptor::array(elem), Some(*size)))
            }
        }
    }
}

/// Statements
impl CodeGen {
    fn block(&mut self, stmts: &[Stmt]) -> IlangResult<()> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    /// Lowers a nested block. Names declared inside stop resolving when
    /// the block ends, but their slots stay allocated.
    fn scoped_block(&mut self, stmts: &[Stmt]) -> IlangResult<()> {
        self.frame.symbols.push_scope();
        let result = self.block(stmts);
        self.frame.symbols.pop_scope();
        result
    }

    fn stmt(&mut self, stmt: &Stmt) -> IlangResult<()> {
        match stmt {
            Stmt::Var(decl) => self.var_decl(decl),
            Stmt::Assign(assign) => self.assign(assign),
            Stmt::If(stmt) => self.if_stmt(stmt),
            Stmt::While(stmt) => self.while_stmt(stmt),
            Stmt::For(stmt) => self.for_stmt(stmt),
            Stmt::Routine(decl) => self.routine(decl),
            Stmt::Return(expr) => self.return_stmt(expr.as_ref()),
            Stmt::Print(expr) => self.print(expr),
            Stmt::Record(decl) => self.record(decl),
            Stmt::Array(decl) => self.array_decl(decl),
            Stmt::Call(call) => {
                match self.call(call)? {
                    Some(ret) if ret.is_wide() => self.emit(Instr::Pop2),
                    Some(_) => self.emit(Instr::Pop),
                    None => {}
                }
                Ok(())
            }
        }
    }

    fn var_decl(&mut self, decl: &VarDecl) -> IlangResult<()> {
        trace!("var {}", decl.name);

        let (desc, array_len) = match (&decl.ty, &decl.init) {
            (Some(ty), Some(init)) => {
                let (desc, array_len) = self.resolve(ty)?;
                self.expr_as(init, &desc)?;
                (desc, array_len)
            }
            (Some(ty), None) => {
                let (desc, array_len) = self.resolve(ty)?;
                self.default_init(&desc, array_len)?;
                (desc, array_len)
            }
            (None, Some(init)) => (self.expr(init)?, None),
            (None, None) => {
                return Err(IlangError::unsupported(format!(
                    "declaration of '{}' has neither a type nor an initializer",
                    decl.name
                )))
            }
        };

        let kind = desc.kind();
        let slot = self.frame.symbols.declare(decl.name.clone(), desc, array_len)?;
        self.emit(Instr::Store(kind, slot));
        Ok(())
    }

    /// Pushes the value a declaration without initializer starts with.
    fn default_init(&mut self, desc: &Descriptor, array_len: Option<u32>) -> IlangResult<()> {
        match desc {
            Descriptor::Int | Descriptor::Bool => self.emit(Instr::IConst(0)),
            Descriptor::Double => self.emit(Instr::DConst0),
            Descriptor::Str => self.emit(Instr::LdcStr(String::new())),
            Descriptor::Object(record) => {
                self.emit(Instr::New(record.clone()));
                self.emit(Instr::Dup);
                self.emit(Instr::Invoke {
                    kind: InvokeKind::Special,
                    owner: record.clone(),
                    name: "<init>".into(),
                    desc: MethodDescriptor::void(),
                });
            }
            Descriptor::Array(elem) => {
                let len = array_len.unwrap_or(0);
                self.new_array(elem, len)?;
            }
        }
        Ok(())
    }

    fn new_array(&mut self, elem: &Descriptor, len: u32) -> IlangResult<()> {
        let len = i32::try_from(len).map_err(|_| IlangError::unsupported(format!("array length {len}")))?;
        self.emit(Instr::LdcInt(len));
        match elem.kind() {
            Kind::Ref => self.emit(Instr::ANewArray(STRING_CLASS.into())),
            kind => self.emit(Instr::NewArray(kind)),
        }
        Ok(())
    }

    fn array_decl(&mut self, decl: &ArrayDecl) -> IlangResult<()> {
        trace!("array {}[{}] of {}", decl.name, decl.size, decl.elem);

        let elem = Descriptor::array_elem(&decl.elem)
            .ok_or_else(|| IlangError::unsupported(format!("array of '{}'", decl.elem)))?;
        self.new_array(&elem, decl.size)?;
        let slot = self
            .frame
            .symbols
            .declare(decl.name.clone(), Descriptor::array(elem), Some(decl.size))?;
        self.emit(Instr::Store(Kind::Ref, slot));
        Ok(())
    }

    fn assign(&mut self, assign: &Assign) -> IlangResult<()> {
        match &assign.target {
            Expr::Ident(name) => {
                let symbol = self.frame.symbols.lookup(name)?;
                let (desc, slot) = (symbol.desc.clone(), symbol.slot);
                self.expr_as(&assign.value, &desc)?;
                self.emit(Instr::Store(desc.kind(), slot));
            }
            Expr::LValue(LValue { base, selector }) => {
                let base = self.expr(base)?;
                match selector {
                    Selector::Field(field) => {
                        let record = record_of(&base)?;
                        let desc = self.records.field(&record, field)?.clone();
                        self.expr_as(&assign.value, &desc)?;
                        self.emit(Instr::PutField {
                            owner: record,
                            name: field.clone(),
                            desc,
                        });
                    }
                    Selector::Index(index) => {
                        let elem = elem_of(&base)?;
                        self.expr_as(index, &Descriptor::Int)?;
                        self.expr_as(&assign.value, &elem)?;
                        self.emit(Instr::ArrayStore(elem.kind()));
                    }
                }
            }
            other => {
                return Err(IlangError::unsupported(format!(
                    "assignment to {}",
                    expr_shape(other)
                )))
            }
        }
        Ok(())
    }

    fn if_stmt(&mut self, stmt: &If) -> IlangResult<()> {
        let end = self.label();
        let mut next = self.label();

        self.condition(&stmt.cond, next)?;
        self.scoped_block(&stmt.then_block)?;
        self.emit(Instr::Goto(end));

        for branch in &stmt.elsif {
            self.emit(Instr::Label(next));
            next = self.label();
            self.condition(&branch.cond, next)?;
            self.scoped_block(&branch.body)?;
            self.emit(Instr::Goto(end));
        }

        self.emit(Instr::Label(next));
        self.scoped_block(&stmt.else_block)?;
        self.emit(Instr::Label(end));
        Ok(())
    }

    fn while_stmt(&mut self, stmt: &While) -> IlangResult<()> {
        let start = self.label();
        let end = self.label();

        self.emit(Instr::Label(start));
        self.condition(&stmt.cond, end)?;
        self.scoped_block(&stmt.body)?;
        self.emit(Instr::Goto(start));
        self.emit(Instr::Label(end));
        Ok(())
    }

    fn for_stmt(&mut self, stmt: &For) -> IlangResult<()> {
        self.expr_as(&stmt.start, &Descriptor::Int)?;

        self.frame.symbols.push_scope();
        let result = self.for_loop(stmt);
        self.frame.symbols.pop_scope();
        result
    }

    fn for_loop(&mut self, stmt: &For) -> IlangResult<()> {
        let slot = self.frame.symbols.declare(stmt.var.clone(), Descriptor::Int, None)?;
        self.emit(Instr::Store(Kind::Int, slot));

        let start = self.label();
        let end = self.label();

        self.emit(Instr::Label(start));
        self.emit(Instr::Load(Kind::Int, slot));
        self.expr_as(&stmt.end, &Descriptor::Int)?;
        self.emit(Instr::IfICmpGt(end));
        self.block(&stmt.body)?;
        self.emit(Instr::IInc(slot, 1));
        self.emit(Instr::Goto(start));
        self.emit(Instr::Label(end));
        Ok(())
    }

    /// Emits the compare of a branch condition, followed by a jump to
    /// `on_false` when it does not hold.
    fn condition(&mut self, cond: &Expr, on_false: Label) -> IlangResult<()> {
        match cond {
            Expr::Binary(bin) if bin.op.is_relational() => {
                self.binary(bin)?;
                self.emit(Instr::If(branch_if_false(bin.op), on_false));
                Ok(())
            }
            Expr::Binary(bin) => Err(IlangError::MalformedCondition(format!(
                "operator '{}' does not compare its operands",
                bin.op
            ))),
            other => Err(IlangError::MalformedCondition(format!(
                "expected a comparison, found {}",
                expr_shape(other)
            ))),
        }
    }

    fn routine(&mut self, decl: &RoutineDecl) -> IlangResult<()> {
        trace!("routine {}", decl.name);

        let params = decl
            .params
            .iter()
            .map(|param| self.resolve(&param.ty))
            .collect::<IlangResult<Vec<_>>>()?;
        let ret = match &decl.ret {
            Some(ty) => Some(self.resolve(ty)?.0),
            None => None,
        };

        let outer = mem::replace(&mut self.frame, Frame::routine(decl.name.clone(), ret.clone()));

        for (param, (desc, array_len)) in decl.params.iter().zip(&params) {
            self.frame
                .symbols
                .declare(param.name.clone(), desc.clone(), *array_len)?;
        }

        self.block(&decl.body)?;
        if !matches!(decl.body.last(), Some(Stmt::Return(_))) {
            self.terminator(ret.as_ref());
        }

        let frame = mem::replace(&mut self.frame, outer);
        let desc = MethodDescriptor::new(params.into_iter().map(|(desc, _)| desc).collect(), ret);
        debug!("registered routine {}{}", decl.name, desc);

        self.methods.push(Method::new(
            decl.name.clone(),
            desc.clone(),
            true,
            frame.symbols.slot_count(),
            frame.code,
        ));
        self.routines.insert(decl.name.clone(), desc);
        Ok(())
    }

    /// Default-valued return appended to bodies that can fall off the end.
    fn terminator(&mut self, ret: Option<&Descriptor>) {
        match ret {
            Some(desc) => {
                self.zero(desc);
                self.emit(Instr::Return(Some(desc.kind())));
            }
            None => self.emit(Instr::Return(None)),
        }
    }

    /// Return opcode follows the shape of the returned expression. A
    /// mismatch with the declared type is reported but not corrected.
    fn return_stmt(&mut self, expr: Option<&Expr>) -> IlangResult<()> {
        let routine = self.frame.routine.clone();
        let declared = self.frame.ret.as_ref().map(Descriptor::kind);

        let kind = match expr {
            Some(expr) => {
                if routine.is_none() {
                    return Err(IlangError::unsupported("returning a value from the entry point"));
                }
                Some(self.expr(expr)?.kind())
            }
            None => None,
        };

        if kind != declared {
            let describe = |kind: Option<Kind>| kind.map(|k| k.to_string()).unwrap_or_else(|| "void".into());
            warn!(
                "routine '{}' declares a {} result but returns a {} value",
                routine.as_deref().unwrap_or("main"),
                describe(declared),
                describe(kind),
            );
        }

        self.emit(Instr::Return(kind));
        Ok(())
    }

    fn print(&mut self, expr: &Expr) -> IlangResult<()> {
        self.emit(Instr::GetStatic {
            owner: "java/lang/System".into(),
            name: "out".into(),
            desc: Descriptor::Object(PRINT_STREAM.into()),
        });
        let desc = self.expr(expr)?;
        self.emit(Instr::Invoke {
            kind: InvokeKind::Virtual,
            owner: PRINT_STREAM.into(),
            name: "println".into(),
            desc: MethodDescriptor::new(vec![desc.print_arg()], None),
        });
        Ok(())
    }

    /// Registers the record layout and emits its unit with a zero
    /// argument constructor.
    fn record(&mut self, decl: &RecordDecl) -> IlangResult<()> {
        trace!("record {}", decl.name);

        let mut fields = IndexMap::new();
        for field in &decl.fields {
            let desc = match (&field.ty, &field.init) {
                (Some(ty), _) => self.resolve(ty)?.0,
                (None, Some(Expr::Literal(lit))) => literal_desc(lit),
                (None, _) => {
                    return Err(IlangError::unsupported(format!(
                        "field '{}' of record '{}' needs a type",
                        field.name, decl.name
                    )))
                }
            };
            fields.insert(field.name.clone(), desc);
        }

        let mut code = vec![
            Instr::Load(Kind::Ref, 0),
            Instr::Invoke {
                kind: InvokeKind::NonVirtual,
                owner: OBJECT_CLASS.into(),
                name: "<init>".into(),
                desc: MethodDescriptor::void(),
            },
        ];
        for (name, desc) in &fields {
            code.push(Instr::Load(Kind::Ref, 0));
            code.push(zero_instr(desc));
            code.push(Instr::PutField {
                owner: decl.name.clone(),
                name: name.clone(),
                desc: desc.clone(),
            });
        }
        code.push(Instr::Return(None));

        let mut unit = Unit::new(decl.name.clone());
        unit.fields = fields
            .iter()
            .map(|(name, desc)| Field {
                name: name.clone(),
                desc: desc.clone(),
            })
            .collect();
        unit.methods.push(Method::new("<init>", MethodDescriptor::void(), false, 1, code));

        self.records.insert(decl.name.clone(), fields);
        self.record_units.push(unit);
        Ok(())
    }
}

/// Expressions
impl CodeGen {
    /// Emits the expression and returns the descriptor of the pushed value.
    fn expr(&mut self, expr: &Expr) -> IlangResult<Descriptor> {
        match expr {
            Expr::Literal(lit) => {
                self.literal(lit);
                Ok(literal_desc(lit))
            }
            Expr::Ident(name) => {
                let symbol = self.frame.symbols.lookup(name)?;
                let (desc, slot) = (symbol.desc.clone(), symbol.slot);
                self.emit(Instr::Load(desc.kind(), slot));
                Ok(desc)
            }
            Expr::Binary(bin) => self.binary(bin),
            Expr::Unary(un) => self.unary(un),
            Expr::LValue(lv) => self.lvalue(lv),
            Expr::Call(call) => self
                .call(call)?
                .ok_or_else(|| IlangError::unsupported(format!("routine '{}' has no result", call.name))),
        }
    }

    /// Emits the expression, widening it to the target when needed.
    ///
    /// References only convert to the exact same descriptor.
    fn expr_as(&mut self, expr: &Expr, target: &Descriptor) -> IlangResult<()> {
        let desc = self.expr(expr)?;
        match (desc.kind(), target.kind()) {
            (Kind::Ref, Kind::Ref) if desc != *target => Err(IlangError::unsupported(format!(
                "{desc} value where a {target} value is expected"
            ))),
            (from, to) if from == to => Ok(()),
            (Kind::Int, Kind::Double) => {
                self.emit(Instr::I2D);
                Ok(())
            }
            (from, to) => Err(IlangError::unsupported(format!(
                "{from} value where a {to} value is expected"
            ))),
        }
    }

    fn literal(&mut self, lit: &Literal) {
        match lit {
            Literal::Int(val) => self.emit(Instr::LdcInt(*val)),
            Literal::Float(val) => self.emit(Instr::LdcDouble(*val)),
            Literal::Bool(val) => self.emit(Instr::IConst(*val as i8)),
            Literal::Str(val) => self.emit(Instr::LdcStr(val.clone())),
        }
    }

    /// Lowers an operation without branching. Relational operators leave
    /// the result of a double compare for the enclosing branch to test.
    fn binary(&mut self, bin: &Binary) -> IlangResult<Descriptor> {
        let lhs = self.type_of(&bin.lhs)?;
        let rhs = self.type_of(&bin.rhs)?;
        let result = binary_result(bin.op, &lhs, &rhs)?;
        let operand = if bin.op.is_relational() {
            Kind::Double
        } else {
            result.kind()
        };

        self.expr(&bin.lhs)?;
        self.widen(lhs.kind(), operand);
        self.expr(&bin.rhs)?;
        self.widen(rhs.kind(), operand);

        let instr = match bin.op {
            BinOp::Add => Instr::Arith(ArithOp::Add, operand),
            BinOp::Sub => Instr::Arith(ArithOp::Sub, operand),
            BinOp::Mul => Instr::Arith(ArithOp::Mul, operand),
            BinOp::Div => Instr::Arith(ArithOp::Div, operand),
            BinOp::Mod => Instr::Arith(ArithOp::Rem, operand),
            BinOp::And => Instr::Logic(LogicOp::And),
            BinOp::Or => Instr::Logic(LogicOp::Or),
            BinOp::Eq | BinOp::NotEq | BinOp::Less | BinOp::LessEq | BinOp::Greater | BinOp::GreaterEq => {
                Instr::DCmpG
            }
        };
        self.emit(instr);

        Ok(result)
    }

    #[inline]
    fn widen(&mut self, from: Kind, to: Kind) {
        if from == Kind::Int && to == Kind::Double {
            self.emit(Instr::I2D);
        }
    }

    fn unary(&mut self, un: &Unary) -> IlangResult<Descriptor> {
        let operand = self.expr(&un.operand)?;
        let result = unary_result(un.op, &operand)?;
        match un.op {
            UnOp::Neg => self.emit(Instr::Neg(operand.kind())),
            UnOp::Not => {
                self.emit(Instr::IConst(1));
                self.emit(Instr::Logic(LogicOp::Xor));
            }
        }
        Ok(result)
    }

    fn lvalue(&mut self, lv: &LValue) -> IlangResult<Descriptor> {
        let base = self.expr(&lv.base)?;
        match &lv.selector {
            Selector::Field(field) => {
                let record = record_of(&base)?;
                let desc = self.records.field(&record, field)?.clone();
                self.emit(Instr::GetField {
                    owner: record,
                    name: field.clone(),
                    desc: desc.clone(),
                });
                Ok(desc)
            }
            Selector::Index(index) => {
                let elem = elem_of(&base)?;
                self.expr_as(index, &Descriptor::Int)?;
                self.emit(Instr::ArrayLoad(elem.kind()));
                Ok(elem)
            }
        }
    }

    /// Emits a static call, returning the result descriptor for
    /// non-void routines.
    fn call(&mut self, call: &Call) -> IlangResult<Option<Descriptor>> {
        let desc = self.routine_desc(&call.name)?.clone();
        if desc.params.len() != call.args.len() {
            return Err(IlangError::unsupported(format!(
                "routine '{}' takes {} argument(s), {} given",
                call.name,
                desc.params.len(),
                call.args.len()
            )));
        }

        for (arg, param) in call.args.iter().zip(&desc.params) {
            self.expr_as(arg, param)?;
        }

        let ret = desc.ret.clone();
        self.emit(Instr::Invoke {
            kind: InvokeKind::Static,
            owner: self.conf.main_class.clone(),
            name: call.name.clone(),
            desc,
        });
        Ok(ret)
    }

    /// Descriptor an expression would push, derived from its shape
    /// without emitting anything.
    fn type_of(&self, expr: &Expr) -> IlangResult<Descriptor> {
        match expr {
            Expr::Literal(lit) => Ok(literal_desc(lit)),
            Expr::Ident(name) => Ok(self.frame.symbols.lookup(name)?.desc.clone()),
            Expr::Binary(bin) => binary_result(bin.op, &self.type_of(&bin.lhs)?, &self.type_of(&bin.rhs)?),
            Expr::Unary(un) => unary_result(un.op, &self.type_of(&un.operand)?),
            Expr::LValue(lv) => {
                let base = self.type_of(&lv.base)?;
                match &lv.selector {
                    Selector::Field(field) => Ok(self.records.field(&record_of(&base)?, field)?.clone()),
                    Selector::Index(_) => elem_of(&base),
                }
            }
            Expr::Call(call) => self
                .routine_desc(&call.name)?
                .ret
                .clone()
                .ok_or_else(|| IlangError::unsupported(format!("routine '{}' has no result", call.name))),
        }
    }

    /// Pushes the zero value of the descriptor's kind.
    fn zero(&mut self, desc: &Descriptor) {
        self.emit(zero_instr(desc));
    }
}

fn zero_instr(desc: &Descriptor) -> Instr {
    match desc.kind() {
        Kind::Int => Instr::IConst(0),
        Kind::Double => Instr::DConst0,
        Kind::Ref => Instr::AConstNull,
    }
}

fn literal_desc(lit: &Literal) -> Descriptor {
    match lit {
        Literal::Int(_) => Descriptor::Int,
        Literal::Float(_) => Descriptor::Double,
        Literal::Bool(_) => Descriptor::Bool,
        Literal::Str(_) => Descriptor::Str,
    }
}

fn binary_result(op: BinOp, lhs: &Descriptor, rhs: &Descriptor) -> IlangResult<Descriptor> {
    let unsupported = || IlangError::unsupported(format!("operator '{op}' on {lhs} and {rhs}"));

    match (lhs.kind(), rhs.kind()) {
        (Kind::Ref, _) | (_, Kind::Ref) => Err(unsupported()),
        (Kind::Int, Kind::Int) if op.is_arithmetic() => Ok(Descriptor::Int),
        _ if op.is_arithmetic() => Ok(Descriptor::Double),
        _ if op.is_relational() => Ok(Descriptor::Int),
        (Kind::Int, Kind::Int) if op.is_logical() => Ok(Descriptor::Bool),
        _ => Err(unsupported()),
    }
}

fn unary_result(op: UnOp, operand: &Descriptor) -> IlangResult<Descriptor> {
    match (op, operand.kind()) {
        (UnOp::Neg, Kind::Int) => Ok(Descriptor::Int),
        (UnOp::Neg, Kind::Double) => Ok(Descriptor::Double),
        (UnOp::Not, Kind::Int) => Ok(Descriptor::Bool),
        _ => Err(IlangError::unsupported(format!("operator '{op}' on {operand}"))),
    }
}

fn record_of(desc: &Descriptor) -> IlangResult<Name> {
    match desc {
        Descriptor::Object(record) => Ok(record.clone()),
        other => Err(IlangError::unsupported(format!("field access on {other}"))),
    }
}

fn elem_of(desc: &Descriptor) -> IlangResult<Descriptor> {
    match desc {
        Descriptor::Array(elem) => Ok(elem.as_ref().clone()),
        other => Err(IlangError::unsupported(format!("indexing into {other}"))),
    }
}

/// Branch taken when the relational condition does not hold, applied
/// to the result of `dcmpg`.
#[rustfmt::skip]
fn branch_if_false(op: BinOp) -> Cond {
    match op {
        BinOp::Greater   => Cond::Le,
        BinOp::Less      => Cond::Ge,
        BinOp::Eq        => Cond::Ne,
        BinOp::GreaterEq => Cond::Lt,
        BinOp::LessEq    => Cond::Gt,
        _                => Cond::Eq,
    }
}

fn expr_shape(expr: &Expr) -> &'static str {
    match expr {
        Expr::Binary(_) => "a binary operation",
        Expr::Unary(_) => "a unary operation",
        Expr::Literal(_) => "a literal",
        Expr::Ident(_) => "an identifier",
        Expr::LValue(_) => "a selector",
        Expr::Call(_) => "a call",
    }
}

// ABOUTME: Lexically-scoped variable/const tables arranged as a chained stack of frames

use crate::value::ScriptValue;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Outcome of `reassign`: whether the name was found, and if so, whether
/// writing through it is illegal because it is bound `const`.
pub enum Reassign {
    Ok,
    NotFound,
    Const,
}

#[derive(Debug, Clone)]
pub struct Environment {
    vars: RefCell<HashMap<String, ScriptValue>>,
    consts: RefCell<HashMap<String, ScriptValue>>,
    labels: RefCell<HashSet<String>>,
    parent: Option<Rc<Environment>>,
    name: String,
}

impl Environment {
    /// Creates the sole global scope. Has no parent.
    pub fn new_global() -> Rc<Self> {
        Rc::new(Environment {
            vars: RefCell::new(HashMap::new()),
            consts: RefCell::new(HashMap::new()),
            labels: RefCell::new(HashSet::new()),
            parent: None,
            name: "<global>".to_string(),
        })
    }

    /// Creates a new child frame under `parent`.
    pub fn with_parent(parent: Rc<Environment>, name: impl Into<String>) -> Rc<Self> {
        Rc::new(Environment {
            vars: RefCell::new(HashMap::new()),
            consts: RefCell::new(HashMap::new()),
            labels: RefCell::new(HashSet::new()),
            parent: Some(parent),
            name: name.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `var` always declares into the root frame, regardless of which
    /// frame this call is made from.
    pub fn declare_var(self: &Rc<Self>, name: &str, value: ScriptValue) -> Result<(), String> {
        self.global_frame().declare(name, value, false)
    }

    /// Declares `name` in THIS frame. Fails if `name` already exists in
    /// either this frame's `vars` or `consts` table; shadowing a name bound
    /// in an ancestor frame is allowed.
    pub fn declare(&self, name: &str, value: ScriptValue, is_const: bool) -> Result<(), String> {
        if self.vars.borrow().contains_key(name) || self.consts.borrow().contains_key(name) {
            return Err(format!("Identifier '{name}' has already been declared"));
        }
        if is_const {
            self.consts.borrow_mut().insert(name.to_string(), value);
        } else {
            self.vars.borrow_mut().insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Walks the parent chain for `name`. Returns the bound value and
    /// whether it is const, or `None` on a miss.
    pub fn lookup(&self, name: &str) -> Option<(ScriptValue, bool)> {
        if let Some(v) = self.vars.borrow().get(name) {
            return Some((v.clone(), false));
        }
        if let Some(v) = self.consts.borrow().get(name) {
            return Some((v.clone(), true));
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    /// Walks the parent chain looking for an existing binding to mutate.
    /// Fails with `Reassign::Const` if the first frame holding `name` binds
    /// it `const`; otherwise mutates in place and returns `Reassign::Ok`.
    pub fn reassign(&self, name: &str, value: ScriptValue) -> Reassign {
        if self.consts.borrow().contains_key(name) {
            return Reassign::Const;
        }
        if self.vars.borrow().contains_key(name) {
            self.vars.borrow_mut().insert(name.to_string(), value);
            return Reassign::Ok;
        }
        match &self.parent {
            Some(p) => p.reassign(name, value),
            None => Reassign::NotFound,
        }
    }

    /// Removes `name` from the nearest frame's `vars` table. Never removes
    /// from `consts` — deleting a const binding is not a thing this
    /// operation does.
    pub fn unset(&self, name: &str) -> bool {
        if self.vars.borrow_mut().remove(name).is_some() {
            return true;
        }
        match &self.parent {
            Some(p) => p.unset(name),
            None => false,
        }
    }

    /// Unconditional set into this frame, bypassing the redeclaration
    /// check. Used by the host to install globals and by the `catch`
    /// handler to bind the exception value.
    pub fn force_set(&self, name: &str, value: ScriptValue, is_const: bool) {
        if is_const {
            self.vars.borrow_mut().remove(name);
            self.consts.borrow_mut().insert(name.to_string(), value);
        } else {
            self.consts.borrow_mut().remove(name);
            self.vars.borrow_mut().insert(name.to_string(), value);
        }
    }

    pub fn global_frame(self: &Rc<Self>) -> Rc<Self> {
        let mut current = self.clone();
        while let Some(parent) = current.parent.clone() {
            current = parent;
        }
        current
    }

    pub fn depth(&self) -> usize {
        match &self.parent {
            Some(p) => 1 + p.depth(),
            None => 0,
        }
    }

    pub fn insert_label(&self, label: String) {
        self.labels.borrow_mut().insert(label);
    }

    pub fn contains_label(&self, label: &str) -> bool {
        if self.labels.borrow().contains(label) {
            return true;
        }
        match &self.parent {
            Some(p) => p.contains_label(label),
            None => false,
        }
    }

    pub fn remove_label_from_current(&self, label: &str) {
        self.labels.borrow_mut().remove(label);
    }
}

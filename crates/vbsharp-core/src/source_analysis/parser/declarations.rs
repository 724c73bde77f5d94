// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Declaration parsing: variables, constants, procedures and classes.

use crate::ast::{
    ClassBlock, CodeBlock, ConstStatement, ConstValue, DeclarationKind, DimStatement,
    DimVariable, FunctionBlock, FunctionKind, Parameter, ReDimStatement, Visibility,
};
use crate::source_analysis::TokenKind;

use super::{Parser, Result, split_on_separators};

impl Parser {
    /// `Private`/`Public` introduce variables, constants or procedures.
    pub(super) fn parse_visibility_prefixed(&mut self) -> Result<CodeBlock> {
        let visibility = if self.at_keyword("private") {
            Visibility::Private
        } else {
            Visibility::Public
        };
        let is_default = self.at_keyword_at(1, "default");
        let keyword_offset = if is_default { 2 } else { 1 };
        if is_default && visibility == Visibility::Private {
            return Err(self.error("'Default' is only valid on Public members"));
        }
        if ["function", "sub", "property"]
            .iter()
            .any(|k| self.at_keyword_at(keyword_offset, k))
        {
            self.position += keyword_offset;
            return self.parse_function(visibility, is_default);
        }
        if is_default {
            return Err(self.error("expected 'Function', 'Sub' or 'Property' after 'Default'"));
        }
        if self.at_keyword_at(1, "const") {
            self.position += 1;
            return self.parse_const(Some(visibility));
        }
        let kind = match visibility {
            Visibility::Private => DeclarationKind::Private,
            Visibility::Public => DeclarationKind::Public,
        };
        self.parse_dim(kind)
    }

    pub(super) fn parse_dim(&mut self, kind: DeclarationKind) -> Result<CodeBlock> {
        let Some(keyword) = self.advance() else {
            return Err(self.error("expected a declaration"));
        };
        let variables = self.parse_variable_list(false)?;
        self.expect_end_of_statement()?;
        Ok(CodeBlock::Dim(DimStatement {
            keyword,
            kind,
            variables,
        }))
    }

    pub(super) fn parse_redim(&mut self) -> Result<CodeBlock> {
        let keyword = self.expect_keyword("redim")?;
        let preserve = self.at_keyword("preserve");
        if preserve {
            self.position += 1;
        }
        let variables = self.parse_variable_list(true)?;
        self.expect_end_of_statement()?;
        Ok(CodeBlock::ReDim(ReDimStatement {
            keyword,
            preserve,
            variables,
        }))
    }

    /// `a, b(10), c()`; `ReDim` requires every name to carry dimensions.
    fn parse_variable_list(&mut self, dimensions_required: bool) -> Result<Vec<DimVariable>> {
        let mut variables = Vec::new();
        loop {
            let name = self.expect_name("a variable name")?;
            let dimensions = if self.current_kind() == Some(TokenKind::OpenBrace) {
                self.position += 1;
                let inner = self.collect_until(|t| t.kind() == TokenKind::CloseBrace);
                if self.current_kind() != Some(TokenKind::CloseBrace) {
                    return Err(self.error("expected ')'"));
                }
                self.position += 1;
                Some(split_on_separators(inner))
            } else {
                None
            };
            if dimensions_required && dimensions.as_ref().is_none_or(Vec::is_empty) {
                return Err(self.error_at(&name, format!("'{}' needs dimensions", name.content())));
            }
            variables.push(DimVariable { name, dimensions });
            if self.current_kind() == Some(TokenKind::ArgumentSeparator) {
                self.position += 1;
            } else {
                return Ok(variables);
            }
        }
    }

    pub(super) fn parse_const(&mut self, visibility: Option<Visibility>) -> Result<CodeBlock> {
        let keyword = self.expect_keyword("const")?;
        let mut values = Vec::new();
        loop {
            let name = self.expect_name("a constant name")?;
            self.expect_operator("=")?;
            let value = self.collect_until(|t| t.kind() == TokenKind::ArgumentSeparator);
            if value.is_empty() {
                return Err(self.error_at(&name, format!("expected a value for '{}'", name.content())));
            }
            values.push(ConstValue { name, value });
            if self.current_kind() == Some(TokenKind::ArgumentSeparator) {
                self.position += 1;
            } else {
                break;
            }
        }
        self.expect_end_of_statement()?;
        Ok(CodeBlock::Const(ConstStatement {
            keyword,
            visibility,
            values,
        }))
    }

    /// `Function`, `Sub` or `Property Get|Let|Set`, from the keyword on.
    pub(super) fn parse_function(&mut self, visibility: Visibility, is_default: bool) -> Result<CodeBlock> {
        let Some(keyword) = self.advance() else {
            return Err(self.error("expected 'Function', 'Sub' or 'Property'"));
        };
        let (kind, end_keyword) = if keyword.is_keyword("function") {
            (FunctionKind::Function, "function")
        } else if keyword.is_keyword("sub") {
            (FunctionKind::Sub, "sub")
        } else {
            let kind = match self.current() {
                Some(t) if t.is_keyword("get") => FunctionKind::PropertyGet,
                Some(t) if t.is_keyword("let") => FunctionKind::PropertyLet,
                Some(t) if t.is_keyword("set") => FunctionKind::PropertySet,
                _ => return Err(self.error("expected 'Get', 'Let' or 'Set' after 'Property'")),
            };
            self.position += 1;
            (kind, "property")
        };
        let name = self.expect_name("a procedure name")?;
        let parameters = if self.current_kind() == Some(TokenKind::OpenBrace) {
            self.parse_parameters()?
        } else {
            Vec::new()
        };
        self.expect_end_of_statement()?;
        let statements = self.parse_blocks(&|p| p.at_end_of(end_keyword))?;
        self.expect_end_of(end_keyword)?;
        Ok(CodeBlock::Function(FunctionBlock {
            keyword,
            kind,
            visibility,
            is_default,
            name,
            parameters,
            statements,
        }))
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>> {
        self.position += 1;
        let mut parameters = Vec::new();
        if self.current_kind() == Some(TokenKind::CloseBrace) {
            self.position += 1;
            return Ok(parameters);
        }
        loop {
            let mut by_ref = true;
            if self.at_keyword("byval") {
                by_ref = false;
                self.position += 1;
            } else if self.at_keyword("byref") {
                self.position += 1;
            }
            let name = self.expect_name("a parameter name")?;
            let is_array = self.current_kind() == Some(TokenKind::OpenBrace)
                && self.peek_at(1).is_some_and(|t| t.kind() == TokenKind::CloseBrace);
            if is_array {
                self.position += 2;
            }
            parameters.push(Parameter {
                name,
                by_ref,
                is_array,
            });
            match self.current_kind() {
                Some(TokenKind::ArgumentSeparator) => self.position += 1,
                Some(TokenKind::CloseBrace) => {
                    self.position += 1;
                    return Ok(parameters);
                }
                _ => return Err(self.error("expected ',' or ')' in parameter list")),
            }
        }
    }

    pub(super) fn parse_class(&mut self) -> Result<CodeBlock> {
        let keyword = self.expect_keyword("class")?;
        let name = self.expect_name("a class name")?;
        self.expect_end_of_statement()?;
        let statements = self.parse_blocks(&|p| p.at_end_of("class"))?;
        self.expect_end_of("class")?;
        Ok(CodeBlock::Class(ClassBlock {
            keyword,
            name,
            statements,
        }))
    }
}

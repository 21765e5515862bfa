// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Expression visitor

use crate::ast::{
    AggregationExpr, BinaryExpr, Expr, FunctionExpr, ParensExpr, RollupExpr, UnaryExpr,
};
use crate::parser::ParseResult;

/// Controls how the visitor recursion should proceed.
pub enum Recursion<V: ExprVisitor> {
    /// Attempt to visit all the children, recursively, of this expression.
    Continue(V),
    /// Do not visit the children of this expression, though the walk
    /// of parents of this expression will not be affected
    Stop(V),
}

/// Encode the traversal of an expression tree. When passed to
/// `Expr::accept`, `ExprVisitor::pre_visit` is invoked
/// recursively on all nodes of an expression tree. See the comments
/// on `Expr::accept` for details on its use
pub trait ExprVisitor: Sized {
    /// Invoked before any children of `expr` are visited.
    fn pre_visit(self, expr: &Expr) -> ParseResult<Recursion<Self>>;

    /// Invoked after all children of `expr` are visited. Default
    /// implementation does nothing.
    fn post_visit(self, _expr: &Expr) -> ParseResult<Self> {
        Ok(self)
    }
}

impl Expr {
    /// Performs a depth first walk of an expression and
    /// its children, calling [`ExprVisitor::pre_visit`] and
    /// `visitor.post_visit`.
    ///
    /// For an expression tree such as
    /// ```text
    /// BinaryExpr (+)
    ///    left: MetricExpr(foo)
    ///    right: MetricExpr(bar)
    /// ```
    ///
    /// The nodes are visited using the following order
    /// ```text
    /// pre_visit(BinaryExpr(+))
    /// pre_visit(MetricExpr(foo))
    /// post_visit(MetricExpr(foo))
    /// pre_visit(MetricExpr(bar))
    /// post_visit(MetricExpr(bar))
    /// post_visit(BinaryExpr(+))
    /// ```
    ///
    /// If an Err result is returned, recursion is stopped immediately
    ///
    /// If `Recursion::Stop` is returned on a call to pre_visit, no
    /// children of that expression are visited, nor is post_visit
    /// called on that expression
    pub fn accept<V: ExprVisitor>(&self, visitor: V) -> ParseResult<V> {
        let visitor = match visitor.pre_visit(self)? {
            Recursion::Continue(visitor) => visitor,
            // If the recursion should stop, do not visit children
            Recursion::Stop(visitor) => return Ok(visitor),
        };

        // recurse (and cover all expression types)
        let visitor = match self {
            Expr::NumberLiteral(_) | Expr::StringLiteral(_) | Expr::MetricExpression(_) => {
                Ok(visitor)
            }
            Expr::Parens(ParensExpr { expr }) => expr.accept(visitor),
            Expr::UnaryOperator(UnaryExpr { expr }) => expr.accept(visitor),
            Expr::BinaryOperator(BinaryExpr { left, right, .. }) => {
                let visitor = left.accept(visitor)?;
                right.accept(visitor)
            }
            Expr::Function(FunctionExpr { args, .. }) => args
                .iter()
                .try_fold(visitor, |visitor, arg| arg.accept(visitor)),
            Expr::Aggregation(AggregationExpr { param, expr, .. }) => {
                let visitor = match param {
                    Some(param) => param.accept(visitor)?,
                    None => visitor,
                };
                expr.accept(visitor)
            }
            Expr::Rollup(RollupExpr { expr, .. }) => expr.accept(visitor),
        }?;

        visitor.post_visit(self)
    }

    /// Calls `f` on this node and every descendant, parents before children.
    pub fn walk<F: FnMut(&Expr)>(&self, f: F) {
        struct FnVisitor<F>(F);

        impl<F: FnMut(&Expr)> ExprVisitor for FnVisitor<F> {
            fn pre_visit(mut self, expr: &Expr) -> ParseResult<Recursion<Self>> {
                (self.0)(expr);
                Ok(Recursion::Continue(self))
            }
        }

        // FnVisitor never fails
        let _ = self.accept(FnVisitor(f));
    }
}

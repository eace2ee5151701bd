//! Declaring types and method signatures shared by the integration tests.
//!
//! The `Svc` methods mirror the small examples used throughout the tests
//! (`f(int) -> String`, `g()`, `h()`); the `shop` types model a tiny domain
//! with cascading (`Store::cart() -> Cart`, `Cart::owner() -> Customer`).

#![allow(dead_code)]

use mock_arena::{ArenaResult, MethodSig, Outcome, ReturnType, TypeSig, Value};

pub fn svc() -> TypeSig {
    TypeSig::new("demo.Svc")
}

/// `String f(int)`
pub fn f() -> MethodSig {
    MethodSig::new("f").param("int").returns(ReturnType::Text)
}

/// `void g()`
pub fn g() -> MethodSig {
    MethodSig::new("g")
}

/// `int h()`
pub fn h() -> MethodSig {
    MethodSig::new("h").returns(ReturnType::Int)
}

/// `void x()`
pub fn x() -> MethodSig {
    MethodSig::new("x")
}

/// `void y()`
pub fn y() -> MethodSig {
    MethodSig::new("y")
}

pub fn store() -> TypeSig {
    TypeSig::new("shop.Store")
}

pub fn cart_type() -> TypeSig {
    TypeSig::new("shop.Cart")
}

pub fn customer_type() -> TypeSig {
    TypeSig::new("shop.Customer")
}

/// `Cart cart()`
pub fn cart() -> MethodSig {
    MethodSig::new("cart").returns(ReturnType::mockable(cart_type()))
}

/// `Cart cartFor(String)`
pub fn cart_for() -> MethodSig {
    MethodSig::new("cartFor")
        .param("String")
        .returns(ReturnType::mockable(cart_type()))
}

/// `Customer owner()` on `Cart`
pub fn owner() -> MethodSig {
    MethodSig::new("owner").returns(ReturnType::mockable(customer_type()))
}

/// `int stock(String)`
pub fn stock() -> MethodSig {
    MethodSig::new("stock").param("String").returns(ReturnType::Int)
}

/// `boolean reserve(String, int)`
pub fn reserve() -> MethodSig {
    MethodSig::new("reserve")
        .param("String")
        .param("int")
        .returns(ReturnType::Bool)
}

/// `double price(String)`
pub fn price() -> MethodSig {
    MethodSig::new("price").param("String").returns(ReturnType::Float)
}

/// Static call on `demo.Svc`.
pub fn call_svc(
    arena: &mock_arena::Arena,
    method: &MethodSig,
    args: impl IntoIterator<Item = Value>,
) -> ArenaResult<Outcome> {
    arena.on_intercepted_call(&svc(), method, None, args)
}

extern crate proc_macro;
extern crate quote;
extern crate syn;

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Index};

// #[derive(Readable)] implements io::Readable<T> for a struct T whose body
// reads (in declaration order) every member of T and returns Ok(T {members}).
// The surrounding module must have `Readable`, `Layout`, `MmResult` and
// `bytes::Buf` in scope, the same as a hand-written impl would.
#[proc_macro_derive(Readable)]
pub fn field_read_fn(item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = parse_macro_input!(item as DeriveInput);

    let name = &ast.ident;
    let body = match read_generate_body(&ast.data) {
        Ok(body) => body,
        Err(e) => return e.to_compile_error().into(),
    };

    let expanded = quote! {
        impl Readable<#name> for #name {
            fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<#name> {
                Ok(#name #body)
            }
        }
    };

    proc_macro::TokenStream::from(expanded)
}

// #[derive(Writable)] implements io::Writable<T> for a struct T whose body
// writes (in declaration order) every member of T and returns Ok
#[proc_macro_derive(Writable)]
pub fn field_write_fn(item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = parse_macro_input!(item as DeriveInput);

    let name = &ast.ident;
    let writes = match write_generate_fields(&ast.data) {
        Ok(writes) => writes,
        Err(e) => return e.to_compile_error().into(),
    };

    let expanded = quote! {
        impl Writable<#name> for #name {
            fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
                #writes
                Ok(())
            }
        }
    };

    proc_macro::TokenStream::from(expanded)
}

fn unsupported(what: &str) -> syn::Error {
    syn::Error::new(
        Span::call_site(),
        format!("Readable/Writable can only be derived for structs, not {}", what),
    )
}

// Named fields become `{ field: <FType as Readable<FType>>::read(from, layout)?, .. }`,
// tuple fields become `( <FType as Readable<FType>>::read(from, layout)?, .. )`.
// The qualified form means generic and array types need no turbofish.
fn read_generate_body(data: &Data) -> syn::Result<TokenStream> {
    match data {
        Data::Struct(ref data) => match data.fields {
            Fields::Named(ref fields) => {
                let field_reads = fields.named.iter().map(|f| {
                    let name = &f.ident;
                    let ftype = &f.ty;
                    quote! {
                        #name: <#ftype as Readable<#ftype>>::read(from, layout)?
                    }
                });
                Ok(quote! {
                    { #(#field_reads, )* }
                })
            }
            Fields::Unnamed(ref fields) => {
                let field_reads = fields.unnamed.iter().map(|f| {
                    let ftype = &f.ty;
                    quote! {
                        <#ftype as Readable<#ftype>>::read(from, layout)?
                    }
                });
                Ok(quote! {
                    ( #(#field_reads, )* )
                })
            }
            Fields::Unit => Err(unsupported("unit structs")),
        },
        Data::Enum(_) => Err(unsupported("enums")),
        Data::Union(_) => Err(unsupported("unions")),
    }
}

// Take all the fields in a struct and generate `self.field.write(to, layout)?`
// for each field.
fn write_generate_fields(data: &Data) -> syn::Result<TokenStream> {
    match data {
        Data::Struct(ref data) => match data.fields {
            Fields::Named(ref fields) => {
                let field_writes = fields.named.iter().map(|f| {
                    let name = &f.ident;
                    quote! {
                        self.#name.write(to, layout)?
                    }
                });
                Ok(quote! {
                    #(#field_writes;)*
                })
            }
            Fields::Unnamed(ref fields) => {
                let field_writes = fields.unnamed.iter().enumerate().map(|(i, _)| {
                    let index = Index::from(i);
                    quote! {
                        self.#index.write(to, layout)?
                    }
                });
                Ok(quote! {
                    #(#field_writes;)*
                })
            }
            Fields::Unit => Err(unsupported("unit structs")),
        },
        Data::Enum(_) => Err(unsupported("enums")),
        Data::Union(_) => Err(unsupported("unions")),
    }
}

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Error, LitStr};

// Derives a lowercase Display impl for an opcode enum, so the IR printer
// can emit mnemonics directly. #[style("...")] overrides the spelling of a
// single variant, e.g. Int2Float -> "sitofp".
#[proc_macro_derive(Mnemonic, attributes(style))]
pub fn derive_mnemonic(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	let name = input.ident;
	let Data::Enum(data) = input.data else {
		return Error::new_spanned(&name, "Mnemonic only applies to enums")
			.to_compile_error()
			.into();
	};
	let mut arms = Vec::new();
	for variant in data.variants {
		let ident = &variant.ident;
		let style =
			variant.attrs.iter().find(|attr| attr.path().is_ident("style"));
		let text = match style {
			Some(attr) => match attr.parse_args::<LitStr>() {
				Ok(lit) => lit.value(),
				Err(_) => {
					return Error::new_spanned(attr, "expected a string literal")
						.to_compile_error()
						.into()
				}
			},
			None => ident.to_string().to_lowercase(),
		};
		arms.push(quote! { #name::#ident => write!(f, "{}", #text) });
	}
	quote! {
		impl std::fmt::Display for #name {
			fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
				match self {
					#( #arms, )*
				}
			}
		}
	}
	.into()
}

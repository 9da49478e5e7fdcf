mod graph_object;

use proc_macro::TokenStream;

#[proc_macro_derive(GraphObject, attributes(graphwire))]
pub fn derive_graph_object(input: TokenStream) -> TokenStream {
    graph_object::derive(input).into()
}

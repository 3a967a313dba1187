use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject
/// dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// [`crate::model::memory::MemoryElectionRepository`]; both refer to the same
/// fresh, empty store.
///
/// An optional status argument, e.g. `#[backend_test(draft)]`, sets the
/// configured default status filter for listings.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract type information and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Configure the default status filter if asked to.
    let default_status_filter = match parse_macro_input!(args as Option<Ident>) {
        Some(status) => {
            let status = status.to_string();
            quote! {
                Some(#status.parse::<crate::model::common::election::ElectionStatus>().unwrap())
            }
        }
        None => quote! { None },
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> (
                rocket::local::asynchronous::Client,
                crate::model::memory::MemoryElectionRepository,
            ) {
                log4rs_test_utils::test_logging::init_logging_once_for(
                    ["live_voting_backend"],
                    None,
                    None,
                );
                let repo = crate::model::memory::MemoryElectionRepository::new();
                let manager = crate::manager::ElectionManager::new(repo.clone());
                let config = crate::config::Config::new(#default_status_filter);
                let rocket_client = rocket::local::asynchronous::Client::tracked(
                    crate::rocket_for_manager(manager, config),
                )
                .await
                .unwrap();
                (rocket_client, repo)
            }

            /// The test itself.
            #item_fn

            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                #[allow(unused_variables)]
                let (rocket_client, repo) = setup().await;
                #new_name(#(#test_args),*).await
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_repo = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    // Valid as the last path segment for any type is itself.
                    let type_ident = type_path.path.segments.last().map(|s| &s.ident);
                    if type_ident.map_or(false, |i| i == "Client") {
                        if has_client {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                            ));
                        }
                        has_client = true;
                        args.push(quote! { rocket_client });
                        continue;
                    } else if type_ident.map_or(false, |i| i == "MemoryElectionRepository") {
                        if has_repo {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `MemoryElectionRepository`",
                            ));
                        }
                        has_repo = true;
                        args.push(quote! { repo.clone() });
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `repo_ident: MemoryElectionRepository`",
        ));
    }

    Ok(args)
}

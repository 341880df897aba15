//! Read-only contract calls described by pointer documents.
use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;
use anyhow::ensure;
use anyhow::Context;
use async_trait::async_trait;
use dynacid_types::pointer::PointerDocument;
use ethers::abi::token::LenientTokenizer;
use ethers::abi::token::Tokenizer;
use ethers::abi::Abi;
use ethers::abi::Function;
use ethers::abi::Token;
use ethers::providers::Http;
use ethers::providers::Middleware;
use ethers::providers::Provider;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::Address;
use ethers::types::Bytes;
use ethers::types::TransactionRequest;
use ethers::types::I256;
use ethers::utils::to_checksum;
use serde_json::Value;
use tracing::debug;

/// Performs the call a pointer document describes against `endpoint`.
///
/// The endpoint is an explicit argument: implementations must not keep a provider around between
/// calls, so concurrent resolutions on different chains never see each other's endpoint.
#[async_trait]
pub trait ContractCaller: Send + Sync {
    async fn call(
        &self,
        document: &PointerDocument,
        endpoint: &str,
    ) -> anyhow::Result<Value>;
}

/// [`ContractCaller`] over JSON-RPC `eth_call`, through an ethers HTTP provider.
#[derive(Clone, Debug)]
pub struct EthersCaller {
    timeout: Duration,
}

impl EthersCaller {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ContractCaller for EthersCaller {
    async fn call(
        &self,
        document: &PointerDocument,
        endpoint: &str,
    ) -> anyhow::Result<Value> {
        let address = Address::from_str(&document.contract_address)
            .with_context(|| format!("invalid contract address `{}`", document.contract_address))?;
        let function = lookup_function(document)?;
        let tokens = tokenize_args(&function, &document.get_function.input_args)?;
        let data = function
            .encode_input(&tokens)
            .with_context(|| format!("encoding arguments of `{}`", function.name))?;

        let provider = Provider::<Http>::try_from(endpoint)
            .with_context(|| format!("invalid RPC endpoint `{endpoint}`"))?;
        let tx: TypedTransaction = TransactionRequest::new()
            .to(address)
            .data(Bytes::from(data))
            .into();

        debug!(
            "calling {}::{} on {endpoint}",
            document.contract_address, function.name
        );
        let output = tokio::time::timeout(self.timeout, provider.call(&tx, None))
            .await
            .map_err(|_| anyhow!("`{}` timed out after {:?}", function.name, self.timeout))?
            .with_context(|| format!("calling `{}` on {endpoint}", function.name))?;

        let decoded = function
            .decode_output(output.as_ref())
            .with_context(|| format!("decoding the output of `{}`", function.name))?;

        Ok(tokens_to_json(decoded))
    }
}

/// Finds the called function in the document's ABI. The first overload wins.
fn lookup_function(document: &PointerDocument) -> anyhow::Result<Function> {
    let abi: Abi = serde_json::from_value(document.contract_abi.clone())
        .context("parsing the contract ABI")?;
    let name = &document.get_function.function_name;
    abi.functions
        .get(name)
        .and_then(|overloads| overloads.first())
        .cloned()
        .ok_or_else(|| anyhow!("function `{name}` is not part of the contract ABI"))
}

/// Tokenizes JSON arguments against the input types of `function`.
pub fn tokenize_args(
    function: &Function,
    args: &[Value],
) -> anyhow::Result<Vec<Token>> {
    ensure!(
        function.inputs.len() == args.len(),
        "`{}` takes {} arguments, {} given",
        function.name,
        function.inputs.len(),
        args.len()
    );

    function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let rendered = render_arg(arg);
            LenientTokenizer::tokenize(&param.kind, &rendered).with_context(|| {
                format!(
                    "argument `{}` of `{}`: `{rendered}` is not a {}",
                    param.name, function.name, param.kind
                )
            })
        })
        .collect()
}

/// Renders a JSON argument in the textual form the ABI tokenizer expects.
fn render_arg(arg: &Value) -> String {
    match arg {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            format!(
                "[{}]",
                items.iter().map(render_arg).collect::<Vec<_>>().join(",")
            )
        },
        other => other.to_string(),
    }
}

/// A single output is returned bare, several as an array.
pub fn tokens_to_json(mut tokens: Vec<Token>) -> Value {
    if tokens.len() == 1 {
        token_to_json(tokens.remove(0))
    } else {
        Value::Array(tokens.into_iter().map(token_to_json).collect())
    }
}

/// Integers become decimal strings, since they routinely exceed what a JSON number holds.
pub fn token_to_json(token: Token) -> Value {
    match token {
        Token::Address(address) => Value::String(to_checksum(&address, None)),
        Token::FixedBytes(bytes) | Token::Bytes(bytes) => {
            Value::String(format!("0x{}", hex::encode(bytes)))
        },
        Token::Int(raw) => Value::String(I256::from_raw(raw).to_string()),
        Token::Uint(value) => Value::String(value.to_string()),
        Token::Bool(b) => Value::Bool(b),
        Token::String(s) => Value::String(s),
        Token::FixedArray(tokens) | Token::Array(tokens) | Token::Tuple(tokens) => {
            Value::Array(tokens.into_iter().map(token_to_json).collect())
        },
    }
}
